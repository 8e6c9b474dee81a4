//! Error types for the kapy-areal crate.

/// Error type for all fallible operations in the kapy-areal crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArealError {
    /// Returned when weights or a mask do not match the number of cells.
    #[error("area '{area_id}': {got} weights for {expected} cells")]
    WeightsLength {
        /// Identifier of the area.
        area_id: String,
        /// Number of grid cells.
        expected: usize,
        /// Number of weights supplied.
        got: usize,
    },

    /// Returned when a weight is negative or not finite.
    #[error("area '{area_id}': invalid weight {value} at cell {cell}")]
    InvalidWeight {
        /// Identifier of the area.
        area_id: String,
        /// Cell index.
        cell: usize,
        /// The offending weight.
        value: f64,
    },
}
