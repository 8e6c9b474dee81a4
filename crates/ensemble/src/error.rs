//! Error types for the kapy-ensemble crate.

/// Error type for all fallible operations in the kapy-ensemble crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnsembleError {
    /// Returned when no members are supplied.
    #[error("ensemble has no members")]
    EmptyEnsemble,

    /// Returned when a requested percentile lies outside 0..=100.
    #[error("percentile {value} outside 0..=100")]
    InvalidPercentile {
        /// The offending percentile.
        value: f64,
    },

    /// Returned when a member's cube or grid shape differs from the first
    /// member's.
    #[error(
        "member {member} ('{id}') has shape {got:?} (bins, seasons, lat, lon), expected {expected:?}"
    )]
    ShapeMismatch {
        /// Position of the member in the input.
        member: usize,
        /// Indicator id of the member.
        id: String,
        /// Shape of the first member.
        expected: (usize, usize, usize, usize),
        /// Shape of this member.
        got: (usize, usize, usize, usize),
    },

    /// Returned when a member's bin or season labels differ from the first
    /// member's.
    #[error("member {member} ('{id}') has different {dimension} labels")]
    AxisMismatch {
        /// Position of the member in the input.
        member: usize,
        /// Indicator id of the member.
        id: String,
        /// The disagreeing dimension.
        dimension: String,
    },

    /// Returned when members disagree on units.
    #[error("member {member} ('{id}') has units '{got}', expected '{expected}'")]
    UnitsMismatch {
        /// Position of the member in the input.
        member: usize,
        /// Indicator id of the member.
        id: String,
        /// Units of the first member.
        expected: String,
        /// Units of this member.
        got: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape_mismatch() {
        let e = EnsembleError::ShapeMismatch {
            member: 2,
            id: "101".into(),
            expected: (3, 2, 10, 10),
            got: (3, 2, 9, 11),
        };
        assert_eq!(
            e.to_string(),
            "member 2 ('101') has shape (3, 2, 9, 11) (bins, seasons, lat, lon), expected (3, 2, 10, 10)"
        );
    }

    #[test]
    fn error_units_mismatch() {
        let e = EnsembleError::UnitsMismatch {
            member: 1,
            id: "101".into(),
            expected: "K".into(),
            got: "degC".into(),
        };
        assert_eq!(
            e.to_string(),
            "member 1 ('101') has units 'degC', expected 'K'"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<EnsembleError>();
    }
}
