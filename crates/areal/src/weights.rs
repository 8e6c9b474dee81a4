//! Per-cell weights of an area.

use kapy_series::Grid;

use crate::error::ArealError;

/// Area identifier used when no mask is applied.
pub const WHOLE_DOMAIN: &str = "all";

/// Non-negative weight per grid cell, tagged with an area identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaWeights {
    area_id: String,
    weights: Vec<f64>,
}

impl AreaWeights {
    /// Equal weights over the whole grid.
    pub fn uniform(grid: &Grid) -> Self {
        Self {
            area_id: WHOLE_DOMAIN.to_string(),
            weights: vec![1.0; grid.n_cells()],
        }
    }

    /// Weights proportional to `cos(latitude)`, approximating cell area on
    /// a regular latitude-longitude grid.
    pub fn cos_latitude(grid: &Grid) -> Self {
        Self {
            area_id: WHOLE_DOMAIN.to_string(),
            weights: (0..grid.n_cells())
                .map(|c| grid.cell_lat(c).to_radians().cos().max(0.0))
                .collect(),
        }
    }

    /// Explicit weights, e.g. cell areas.
    ///
    /// # Errors
    ///
    /// Returns [`ArealError::InvalidWeight`] for a negative or non-finite
    /// weight.
    pub fn from_values(area_id: impl Into<String>, weights: Vec<f64>) -> Result<Self, ArealError> {
        let area_id = area_id.into();
        if let Some((cell, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ArealError::InvalidWeight {
                area_id,
                cell,
                value,
            });
        }
        Ok(Self { area_id, weights })
    }

    /// Restricts the weights to the cells where `mask` is true and renames
    /// the area.
    ///
    /// # Errors
    ///
    /// Returns [`ArealError::WeightsLength`] if `mask` has the wrong length.
    pub fn with_mask(self, area_id: impl Into<String>, mask: &[bool]) -> Result<Self, ArealError> {
        let area_id = area_id.into();
        if mask.len() != self.weights.len() {
            return Err(ArealError::WeightsLength {
                area_id,
                expected: self.weights.len(),
                got: mask.len(),
            });
        }
        let weights = self
            .weights
            .iter()
            .zip(mask)
            .map(|(&w, &inside)| if inside { w } else { 0.0 })
            .collect();
        Ok(Self { area_id, weights })
    }

    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weighted mean and standard deviation of `values`, skipping missing
    /// values and zero weights. `(NaN, NaN)` if nothing remains.
    pub fn mean_sd(&self, values: &[f64]) -> (f64, f64) {
        let pairs: Vec<(f64, f64)> = values
            .iter()
            .zip(&self.weights)
            .filter(|&(v, w)| !v.is_nan() && *w > 0.0)
            .map(|(&v, &w)| (v, w))
            .collect();
        let total: f64 = pairs.iter().map(|(_, w)| w).sum();
        if pairs.is_empty() || total <= 0.0 {
            return (f64::NAN, f64::NAN);
        }
        let mean = pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total;
        let var = pairs
            .iter()
            .map(|(v, w)| w * (v - mean) * (v - mean))
            .sum::<f64>()
            / total;
        (mean, var.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cos_latitude_weights() {
        let grid = Grid::new(vec![0.0, 60.0], vec![10.0]);
        let w = AreaWeights::cos_latitude(&grid);
        assert_relative_eq!(w.weights()[0], 1.0);
        assert_relative_eq!(w.weights()[1], 0.5, epsilon = 1e-12);
        assert_eq!(w.area_id(), "all");
    }

    #[test]
    fn weighted_mean_and_sd() {
        let w = AreaWeights::from_values("a", vec![1.0, 3.0]).unwrap();
        let (mean, sd) = w.mean_sd(&[0.0, 4.0]);
        assert_relative_eq!(mean, 3.0);
        assert_relative_eq!(sd, 3.0_f64.sqrt());
    }

    #[test]
    fn mask_zeroes_outside_cells() {
        let grid = Grid::with_shape(1, 3);
        let w = AreaWeights::uniform(&grid)
            .with_mask("basin", &[true, false, true])
            .unwrap();
        assert_eq!(w.weights(), &[1.0, 0.0, 1.0]);
        let (mean, _) = w.mean_sd(&[1.0, 100.0, f64::NAN]);
        assert_eq!(mean, 1.0);
    }

    #[test]
    fn rejects_negative_weight() {
        assert!(matches!(
            AreaWeights::from_values("a", vec![1.0, -1.0]),
            Err(ArealError::InvalidWeight { cell: 1, .. })
        ));
    }

    #[test]
    fn nothing_left_is_nan() {
        let w = AreaWeights::from_values("a", vec![0.0]).unwrap();
        let (mean, sd) = w.mean_sd(&[1.0]);
        assert!(mean.is_nan() && sd.is_nan());
    }
}
