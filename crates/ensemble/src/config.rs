//! Configuration for ensemble combination.

use crate::error::EnsembleError;

/// Configuration for [`crate::combine_ensemble`].
///
/// # Example
///
/// ```
/// use kapy_ensemble::EnsembleConfig;
///
/// let config = EnsembleConfig::new().with_percentiles(vec![90.0, 10.0, 50.0, 50.0]);
/// assert_eq!(config.percentiles(), &[10.0, 50.0, 90.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleConfig {
    percentiles: Vec<f64>,
}

impl EnsembleConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `percentiles = [10, 50, 90]`.
    pub fn new() -> Self {
        Self {
            percentiles: vec![10.0, 50.0, 90.0],
        }
    }

    /// Sets the percentiles (0..=100); they are sorted and deduplicated.
    pub fn with_percentiles(mut self, mut percentiles: Vec<f64>) -> Self {
        percentiles.sort_by(f64::total_cmp);
        percentiles.dedup();
        self.percentiles = percentiles;
        self
    }

    /// Returns the percentiles in ascending order.
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    /// Validates this configuration.
    ///
    /// Checks that every percentile lies in `0..=100`.
    pub fn validate(&self) -> Result<(), EnsembleError> {
        if let Some(&value) = self
            .percentiles
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(EnsembleError::InvalidPercentile { value });
        }
        Ok(())
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(EnsembleConfig::new().percentiles(), &[10.0, 50.0, 90.0]);
    }

    #[test]
    fn out_of_range_percentile() {
        let cfg = EnsembleConfig::new().with_percentiles(vec![50.0, 101.0]);
        assert!(matches!(
            cfg.validate(),
            Err(EnsembleError::InvalidPercentile { value }) if value == 101.0
        ));
        assert!(EnsembleConfig::new().with_percentiles(vec![f64::NAN]).validate().is_err());
    }
}
