//! Indicator results: indicator and delta cubes over bins, seasons and cells.

use std::collections::BTreeMap;

use kapy_series::{Grid, TimeAxis};

use crate::definition::DeltaType;
use crate::error::IndicatorError;

/// The binned time dimension of an indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum BinAxis {
    /// One bin per period, labelled by period id.
    Periods(Vec<String>),
    /// One bin per canonical timestamp (years or months binning).
    Times(TimeAxis),
}

impl BinAxis {
    pub fn len(&self) -> usize {
        match self {
            BinAxis::Periods(ids) => ids.len(),
            BinAxis::Times(axis) => axis.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text label of each bin: the period id or the ISO date.
    pub fn labels(&self) -> Vec<String> {
        match self {
            BinAxis::Periods(ids) => ids.clone(),
            BinAxis::Times(axis) => axis.dates().iter().map(ToString::to_string).collect(),
        }
    }

    /// Name of the dimension (`periodID` or `time`).
    pub fn dimension(&self) -> &'static str {
        match self {
            BinAxis::Periods(_) => "periodID",
            BinAxis::Times(_) => "time",
        }
    }
}

/// Axes shared by indicator and ensemble cubes.
///
/// Values are laid out row-major as `[bin][season][cell]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorAxes {
    bins: BinAxis,
    seasons: Vec<String>,
    grid: Grid,
}

impl IndicatorAxes {
    pub fn new(bins: BinAxis, seasons: Vec<String>, grid: Grid) -> Self {
        Self {
            bins,
            seasons,
            grid,
        }
    }

    pub fn bins(&self) -> &BinAxis {
        &self.bins
    }

    pub fn seasons(&self) -> &[String] {
        &self.seasons
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// `(n_bins, n_seasons, n_cells)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bins.len(), self.seasons.len(), self.grid.n_cells())
    }

    /// Number of values in one cube.
    pub fn len(&self) -> usize {
        let (b, s, c) = self.shape();
        b * s * c
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat position of `(bin, season, cell)`.
    pub fn index(&self, bin: usize, season: usize, cell: usize) -> usize {
        let (_, s, c) = self.shape();
        (bin * s + season) * c + cell
    }
}

/// Output of [`crate::build_indicator`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorResult {
    id: String,
    units: String,
    axes: IndicatorAxes,
    indicator: Vec<f64>,
    delta: Vec<f64>,
    reference: Vec<f64>,
    delta_type: DeltaType,
    attributes: BTreeMap<String, String>,
}

impl IndicatorResult {
    /// Assembles a result.
    ///
    /// `reference` holds one value per `(season, cell)`.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidConfig`] if a cube does not match
    /// the axes.
    pub fn new(
        id: impl Into<String>,
        units: impl Into<String>,
        axes: IndicatorAxes,
        indicator: Vec<f64>,
        delta: Vec<f64>,
        reference: Vec<f64>,
        delta_type: DeltaType,
    ) -> Result<Self, IndicatorError> {
        let id = id.into();
        let (_, n_seasons, n_cells) = axes.shape();
        for (field, len, expected) in [
            ("indicator", indicator.len(), axes.len()),
            ("delta", delta.len(), axes.len()),
            ("reference", reference.len(), n_seasons * n_cells),
        ] {
            if len != expected {
                return Err(IndicatorError::InvalidConfig {
                    reason: format!(
                        "indicator '{id}': {field} has {len} values, axes need {expected}"
                    ),
                });
            }
        }
        Ok(Self {
            id,
            units: units.into(),
            axes,
            indicator,
            delta,
            reference,
            delta_type,
            attributes: BTreeMap::new(),
        })
    }

    /// Replaces the attributes.
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn axes(&self) -> &IndicatorAxes {
        &self.axes
    }

    pub fn delta_type(&self) -> DeltaType {
        self.delta_type
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The indicator cube, `[bin][season][cell]`.
    pub fn indicator_values(&self) -> &[f64] {
        &self.indicator
    }

    /// The delta cube, `[bin][season][cell]`.
    pub fn delta_values(&self) -> &[f64] {
        &self.delta
    }

    /// The reference used for the deltas, `[season][cell]`.
    pub fn reference_values(&self) -> &[f64] {
        &self.reference
    }

    pub fn indicator(&self, bin: usize, season: usize, cell: usize) -> f64 {
        self.indicator[self.axes.index(bin, season, cell)]
    }

    pub fn delta(&self, bin: usize, season: usize, cell: usize) -> f64 {
        self.delta[self.axes.index(bin, season, cell)]
    }

    pub fn reference(&self, season: usize, cell: usize) -> f64 {
        self.reference[season * self.axes.grid().n_cells() + cell]
    }
}
