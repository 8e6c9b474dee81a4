//! Error types for the kapy-indicators crate.

use kapy_series::SeriesError;

/// Error type for all fallible operations in the kapy-indicators crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndicatorError {
    /// Returned when a statistic name is not recognised or a custom
    /// statistic has not been registered.
    #[error("unknown indicator statistic: '{name}'")]
    UnknownStatistic {
        /// The unrecognised statistic name.
        name: String,
    },

    /// Returned when a delta type is neither `subtract` nor `divide`.
    #[error("unknown delta type: '{name}' (expected subtract or divide)")]
    UnknownDeltaType {
        /// The unrecognised delta type.
        name: String,
    },

    /// Returned when a time-binning mode is not recognised.
    #[error("unknown time binning: '{name}' (expected periods, years or months)")]
    UnknownTimeBinning {
        /// The unrecognised mode.
        name: String,
    },

    /// Returned when a comparison operator is not recognised.
    #[error("unknown comparison operator: '{op}'")]
    UnknownOperator {
        /// The unrecognised operator.
        op: String,
    },

    /// Returned when a statistic lacks a mandatory argument.
    #[error("statistic '{statistic}' requires argument '{argument}'")]
    MissingArgument {
        /// Name of the statistic.
        statistic: String,
        /// Name of the missing argument.
        argument: String,
    },

    /// Returned when a count threshold does not parse as a number.
    #[error("cannot convert threshold '{value}' to a number")]
    InvalidThreshold {
        /// The threshold text as configured.
        value: String,
    },

    /// Returned when an indicator requests a season that is not defined.
    #[error("indicator '{indicator_id}' requests unknown season '{season_id}'")]
    UnknownSeason {
        /// Identifier of the requesting indicator.
        indicator_id: String,
        /// The unknown season identifier.
        season_id: String,
    },

    /// Returned when a season's month list is invalid.
    #[error("invalid season '{id}': {reason}")]
    InvalidSeason {
        /// Season identifier.
        id: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a period ends before it starts.
    #[error("invalid period '{id}': start year {start} is after end year {end}")]
    InvalidPeriod {
        /// Period identifier.
        id: String,
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },

    /// Returned when an indicator definition or context is incomplete.
    #[error("invalid indicator configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a custom statistic fails or returns the wrong shape.
    #[error("custom statistic of indicator '{indicator_id}' failed: {reason}")]
    CustomStatisticFailed {
        /// Identifier of the indicator being built.
        indicator_id: String,
        /// Message of the underlying failure.
        reason: String,
    },

    /// Wraps an error from the kapy-series crate.
    #[error(transparent)]
    Series(#[from] SeriesError),
}
