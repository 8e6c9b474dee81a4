//! Error types for the kapy-quantile-map crate.

use kapy_series::SeriesError;

/// Error type for all fallible operations in the kapy-quantile-map crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuantileMapError {
    /// Returned when a calibration method name is not recognised.
    #[error("unsupported calibration method: '{name}'")]
    UnsupportedMethod {
        /// The unrecognised method name.
        name: String,
    },

    /// Returned when a grouping name is not recognised.
    #[error("unknown grouping: '{name}' (expected none, month or season)")]
    UnknownGrouping {
        /// The unrecognised grouping name.
        name: String,
    },

    /// Returned when an adjustment kind is not recognised.
    #[error("unknown adjustment kind: '{name}' (expected + or *)")]
    UnknownKind {
        /// The unrecognised kind.
        name: String,
    },

    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a training or target series has no time steps.
    #[error("series '{variable}' has no time steps")]
    EmptyData {
        /// Variable name of the empty series.
        variable: String,
    },

    /// Returned when reference and historical series cover different years.
    #[error(
        "calibration period mismatch: reference covers {reference_start}-{reference_end}, historical covers {historical_start}-{historical_end}"
    )]
    PeriodMismatch {
        /// First year of the reference series.
        reference_start: i32,
        /// Last year of the reference series.
        reference_end: i32,
        /// First year of the historical series.
        historical_start: i32,
        /// Last year of the historical series.
        historical_end: i32,
    },

    /// Returned when a training group has fewer valid values than required.
    #[error(
        "insufficient data in cell {cell}, group {group}: {n_valid} valid values, need at least {required}"
    )]
    InsufficientData {
        /// Grid cell index.
        cell: usize,
        /// Label of the group (e.g. a month number).
        group: String,
        /// Number of non-missing values found.
        n_valid: usize,
        /// Number of values required.
        required: usize,
    },

    /// Returned when the corrected maximum temperature falls below the
    /// corrected minimum temperature.
    #[error(
        "physical consistency violated for model '{model_id}': tasmax < tasmin at {n_violations} points in cells {cells:?}"
    )]
    PhysicalConsistency {
        /// Identifier of the model being corrected.
        model_id: String,
        /// Number of `(time, cell)` points where the invariant fails.
        n_violations: usize,
        /// Distinct cell indices with at least one violation.
        cells: Vec<usize>,
    },

    /// Wraps an error from the kapy-series crate.
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unsupported_method() {
        let e = QuantileMapError::UnsupportedMethod {
            name: "cmethods-linear".into(),
        };
        assert_eq!(e.to_string(), "unsupported calibration method: 'cmethods-linear'");
    }

    #[test]
    fn error_insufficient_data() {
        let e = QuantileMapError::InsufficientData {
            cell: 3,
            group: "month 2".into(),
            n_valid: 12,
            required: 20,
        };
        assert_eq!(
            e.to_string(),
            "insufficient data in cell 3, group month 2: 12 valid values, need at least 20"
        );
    }

    #[test]
    fn error_period_mismatch() {
        let e = QuantileMapError::PeriodMismatch {
            reference_start: 1991,
            reference_end: 2020,
            historical_start: 1991,
            historical_end: 2005,
        };
        assert_eq!(
            e.to_string(),
            "calibration period mismatch: reference covers 1991-2020, historical covers 1991-2005"
        );
    }

    #[test]
    fn error_physical_consistency() {
        let e = QuantileMapError::PhysicalConsistency {
            model_id: "EUR-11_rcp85".into(),
            n_violations: 4,
            cells: vec![0, 7],
        };
        assert_eq!(
            e.to_string(),
            "physical consistency violated for model 'EUR-11_rcp85': tasmax < tasmin at 4 points in cells [0, 7]"
        );
    }

    #[test]
    fn error_from_series() {
        let e: QuantileMapError = SeriesError::TimeNotIncreasing { index: 2 }.into();
        assert_eq!(e.to_string(), "time axis is not strictly increasing at index 2");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<QuantileMapError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<QuantileMapError>();
    }
}
