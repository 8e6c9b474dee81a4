//! Trained transfer functions.

use std::collections::BTreeMap;

use kapy_series::Grid;
use kapy_stats::nearest_index;

use crate::config::{Extrapolation, Interpolation, QmConfig};

/// Transfer function of one training group in one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFit {
    hist_quantiles: Vec<f64>,
    factors: Vec<f64>,
    scaling: f64,
}

impl GroupFit {
    pub(crate) fn new(hist_quantiles: Vec<f64>, factors: Vec<f64>, scaling: f64) -> Self {
        Self {
            hist_quantiles,
            factors,
            scaling,
        }
    }

    /// Historical-model values at the quantile nodes (empty for scaling).
    ///
    /// For detrended mapping these are quantiles of the mean-normalised
    /// historical series.
    pub fn hist_quantiles(&self) -> &[f64] {
        &self.hist_quantiles
    }

    /// Correction factor per quantile node, or a single factor for scaling.
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Mean shift between reference and historical series (detrended mapping
    /// only; the neutral value of the adjustment kind otherwise).
    pub fn scaling(&self) -> f64 {
        self.scaling
    }
}

/// Per-group transfer functions of one grid cell, keyed by group key.
#[derive(Debug, Clone, PartialEq)]
pub struct CellModel {
    groups: BTreeMap<u8, GroupFit>,
}

impl CellModel {
    pub(crate) fn new(groups: BTreeMap<u8, GroupFit>) -> Self {
        Self { groups }
    }

    /// Transfer function for group `key`, if that group was trained.
    pub fn group(&self, key: u8) -> Option<&GroupFit> {
        self.groups.get(&key)
    }

    /// All trained groups.
    pub fn groups(&self) -> &BTreeMap<u8, GroupFit> {
        &self.groups
    }
}

/// A trained quantile-mapping model.
///
/// Created by [`crate::train`] and immutable thereafter. Holds one
/// [`CellModel`] per grid cell; cells whose reference or historical series
/// is entirely missing (e.g. sea points of a land mask) are `None` and adjust
/// to `NaN`.
#[derive(Debug, Clone)]
pub struct QuantileMappingModel {
    config: QmConfig,
    quantiles: Vec<f64>,
    grid: Grid,
    units: String,
    cells: Vec<Option<CellModel>>,
}

impl QuantileMappingModel {
    pub(crate) fn new(
        config: QmConfig,
        quantiles: Vec<f64>,
        grid: Grid,
        units: String,
        cells: Vec<Option<CellModel>>,
    ) -> Self {
        Self {
            config,
            quantiles,
            grid,
            units,
            cells,
        }
    }

    /// The configuration the model was trained with.
    pub fn config(&self) -> &QmConfig {
        &self.config
    }

    /// Quantile levels of the nodes.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    /// Grid of the training series.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Units of the training series.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Model of cell `cell`, `None` if the cell was masked.
    pub fn cell(&self, cell: usize) -> Option<&CellModel> {
        self.cells.get(cell).and_then(Option::as_ref)
    }

    /// Transfer function of group `key` in cell `cell`.
    pub fn group_fit(&self, cell: usize, key: u8) -> Option<&GroupFit> {
        self.cell(cell).and_then(|c| c.group(key))
    }

    /// Number of cells.
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of masked cells.
    pub fn n_masked(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

/// Correction factor at `x` on the node axis `nodes` (ascending).
pub(crate) fn factor_at(
    nodes: &[f64],
    factors: &[f64],
    x: f64,
    extrapolation: Extrapolation,
    interpolation: Interpolation,
) -> f64 {
    if x.is_nan() || nodes.is_empty() {
        return f64::NAN;
    }
    let last = nodes.len() - 1;
    if x < nodes[0] || x > nodes[last] {
        return match extrapolation {
            Extrapolation::Nan => f64::NAN,
            Extrapolation::Constant if x < nodes[0] => factors[0],
            Extrapolation::Constant => factors[last],
        };
    }
    match interpolation {
        Interpolation::Nearest => factors[nearest_index(nodes, x)],
        Interpolation::Linear => {
            let upper = nodes.partition_point(|&n| n < x);
            if upper == 0 {
                return factors[0];
            }
            let lower = upper - 1;
            let span = nodes[upper] - nodes[lower];
            if span <= 0.0 {
                return factors[upper];
            }
            let w = (x - nodes[lower]) / span;
            factors[lower] + w * (factors[upper] - factors[lower])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NODES: [f64; 3] = [1.0, 2.0, 4.0];
    const AF: [f64; 3] = [10.0, 20.0, 40.0];

    #[test]
    fn nearest_inside() {
        let f = |x| factor_at(&NODES, &AF, x, Extrapolation::Constant, Interpolation::Nearest);
        assert_eq!(f(1.4), 10.0);
        assert_eq!(f(1.6), 20.0);
        assert_eq!(f(3.1), 40.0);
    }

    #[test]
    fn linear_inside() {
        let f = |x| factor_at(&NODES, &AF, x, Extrapolation::Constant, Interpolation::Linear);
        assert_relative_eq!(f(1.5), 15.0);
        assert_relative_eq!(f(3.0), 30.0);
        assert_relative_eq!(f(4.0), 40.0);
    }

    #[test]
    fn constant_extrapolation_uses_boundary() {
        let f = |x| factor_at(&NODES, &AF, x, Extrapolation::Constant, Interpolation::Nearest);
        assert_eq!(f(-1e9), 10.0);
        assert_eq!(f(1e9), 40.0);
    }

    #[test]
    fn nan_extrapolation() {
        let v = factor_at(&NODES, &AF, 5.0, Extrapolation::Nan, Interpolation::Nearest);
        assert!(v.is_nan());
    }

    #[test]
    fn missing_value_stays_missing() {
        let v = factor_at(&NODES, &AF, f64::NAN, Extrapolation::Constant, Interpolation::Nearest);
        assert!(v.is_nan());
    }
}
