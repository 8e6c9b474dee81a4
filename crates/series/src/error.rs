//! Error types for the kapy-series crate.

use kapy_calendar::CalendarError;

/// Error type for all fallible operations in the kapy-series crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    /// Returned when a data array does not match the size implied by its axes.
    #[error("length mismatch for '{name}': expected {expected} elements, got {got}")]
    LengthMismatch {
        /// Name of the array or axis.
        name: String,
        /// Number of elements implied by the axes.
        expected: usize,
        /// Number of elements supplied.
        got: usize,
    },

    /// Returned when two series in one joint operation have different grids.
    #[error(
        "shape mismatch in {context}: {left_ny}x{left_nx} grid vs {right_ny}x{right_nx} grid"
    )]
    ShapeMismatch {
        /// Operation that compared the two series.
        context: String,
        /// Rows of the left grid.
        left_ny: usize,
        /// Columns of the left grid.
        left_nx: usize,
        /// Rows of the right grid.
        right_ny: usize,
        /// Columns of the right grid.
        right_nx: usize,
    },

    /// Returned when two series in one joint operation have different time axes.
    #[error("time axis mismatch in {context}: {left} vs {right} time steps")]
    TimeMismatch {
        /// Operation that compared the two series.
        context: String,
        /// Length of the left time axis.
        left: usize,
        /// Length of the right time axis.
        right: usize,
    },

    /// Returned when the same variable is given in two different units.
    #[error("units mismatch for variable '{variable}': '{expected}' vs '{got}'")]
    UnitsMismatch {
        /// Variable identity.
        variable: String,
        /// Units of the first occurrence.
        expected: String,
        /// Conflicting units.
        got: String,
    },

    /// Returned when time stamps are not strictly increasing.
    #[error("time axis is not strictly increasing at index {index}")]
    TimeNotIncreasing {
        /// First index whose date is not after its predecessor.
        index: usize,
    },

    /// Returned when a derived variable names a processor nobody registered.
    #[error("unknown derived-variable processor: '{name}'")]
    UnknownProcessor {
        /// The requested processor name.
        name: String,
    },

    /// Returned when a processor input was not supplied.
    #[error("derived variable '{variable}' needs input '{input}'")]
    MissingInput {
        /// Id of the derived variable.
        variable: String,
        /// Name of the missing input.
        input: String,
    },

    /// Returned when a processor rejects its inputs or arguments.
    #[error("derived variable '{variable}' failed: {reason}")]
    DerivationFailed {
        /// Id of the derived variable.
        variable: String,
        /// What went wrong.
        reason: String,
    },

    /// Wraps an error from the kapy-calendar crate.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_length_mismatch() {
        let e = SeriesError::LengthMismatch {
            name: "values".into(),
            expected: 24,
            got: 23,
        };
        assert_eq!(
            e.to_string(),
            "length mismatch for 'values': expected 24 elements, got 23"
        );
    }

    #[test]
    fn error_shape_mismatch() {
        let e = SeriesError::ShapeMismatch {
            context: "train".into(),
            left_ny: 2,
            left_nx: 3,
            right_ny: 3,
            right_nx: 2,
        };
        assert_eq!(e.to_string(), "shape mismatch in train: 2x3 grid vs 3x2 grid");
    }

    #[test]
    fn error_units_mismatch() {
        let e = SeriesError::UnitsMismatch {
            variable: "tas".into(),
            expected: "K".into(),
            got: "degC".into(),
        };
        assert_eq!(e.to_string(), "units mismatch for variable 'tas': 'K' vs 'degC'");
    }

    #[test]
    fn error_missing_input() {
        let e = SeriesError::MissingInput {
            variable: "dtr".into(),
            input: "tasmin".into(),
        };
        assert_eq!(e.to_string(), "derived variable 'dtr' needs input 'tasmin'");
    }

    #[test]
    fn error_from_calendar() {
        let e: SeriesError = CalendarError::InvalidMonth { month: 0 }.into();
        assert_eq!(e.to_string(), "invalid month: 0 (must be 1..=12)");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SeriesError>();
    }
}
