//! Error types for kapy-io.

use std::path::PathBuf;

use kapy_calendar::CalendarError;
use kapy_indicators::IndicatorError;
use kapy_series::SeriesError;

/// Error type for all fallible operations in the kapy-io crate.
///
/// Covers file system failures, malformed JSON, and checkpoints whose
/// content does not describe a valid series or indicator result.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when reading or writing a file fails.
    #[error("cannot access {}: {source}", path.display())]
    File {
        /// Path that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a file is not valid checkpoint JSON.
    #[error("invalid JSON in {}: {reason}", path.display())]
    Json {
        /// Path of the checkpoint.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// Returned when no variable has a `time` or `periodID` dimension.
    #[error("no 'time' or 'periodID' dimension in {}", path.display())]
    MissingTimeDimension {
        /// Path of the checkpoint.
        path: PathBuf,
    },

    /// Returned when a checkpoint is well-formed JSON but inconsistent.
    #[error("invalid checkpoint {}: {reason}", path.display())]
    InvalidCheckpoint {
        /// Path of the checkpoint.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// Wraps an error originating from the kapy-calendar crate.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Wraps an error originating from the kapy-series crate.
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// Wraps an error originating from the kapy-indicators crate.
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}
