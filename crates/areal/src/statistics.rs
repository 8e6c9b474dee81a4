//! Areal statistics over indicator and ensemble cubes.

use kapy_ensemble::EnsembleStatistics;
use kapy_indicators::{IndicatorAxes, IndicatorResult};
use tracing::info;

use crate::error::ArealError;
use crate::weights::AreaWeights;

/// Spatial statistic of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArealStatistic {
    Mean,
    Sd,
}

impl ArealStatistic {
    pub fn name(self) -> &'static str {
        match self {
            ArealStatistic::Mean => "mean",
            ArealStatistic::Sd => "sd",
        }
    }
}

/// One spatial layer of a cube: the cell values of a field at a fixed bin,
/// season and (for ensemble percentile fields) percentile.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<'a> {
    pub field: String,
    pub bin: usize,
    pub season: usize,
    pub percentile: Option<f64>,
    pub values: &'a [f64],
}

/// A cube that can be reduced over its cells.
pub trait ArealSource {
    fn axes(&self) -> &IndicatorAxes;

    /// Every spatial layer, in field then bin then season order.
    fn layers(&self) -> Vec<Layer<'_>>;
}

fn cube_layers<'a>(field: &str, values: &'a [f64], axes: &IndicatorAxes) -> Vec<Layer<'a>> {
    let (n_bins, n_seasons, n_cells) = axes.shape();
    let mut out = Vec::with_capacity(n_bins * n_seasons);
    for bin in 0..n_bins {
        for season in 0..n_seasons {
            let start = axes.index(bin, season, 0);
            out.push(Layer {
                field: field.to_string(),
                bin,
                season,
                percentile: None,
                values: &values[start..start + n_cells],
            });
        }
    }
    out
}

impl ArealSource for IndicatorResult {
    fn axes(&self) -> &IndicatorAxes {
        IndicatorResult::axes(self)
    }

    fn layers(&self) -> Vec<Layer<'_>> {
        let axes = IndicatorResult::axes(self);
        let mut layers = cube_layers("indicator", self.indicator_values(), axes);
        layers.extend(cube_layers("delta", self.delta_values(), axes));
        layers
    }
}

impl ArealSource for EnsembleStatistics {
    fn axes(&self) -> &IndicatorAxes {
        EnsembleStatistics::axes(self)
    }

    fn layers(&self) -> Vec<Layer<'_>> {
        let axes = EnsembleStatistics::axes(self);
        let (n_bins, n_seasons, n_cells) = axes.shape();
        let mut layers = Vec::new();
        for (name, values) in self.fields() {
            if !name.ends_with("_percentiles") {
                layers.extend(cube_layers(name, values, axes));
                continue;
            }
            for bin in 0..n_bins {
                for season in 0..n_seasons {
                    for (p, &percentile) in self.percentiles().iter().enumerate() {
                        let start = ((bin * n_seasons + season) * self.percentiles().len() + p)
                            * n_cells;
                        layers.push(Layer {
                            field: name.clone(),
                            bin,
                            season,
                            percentile: Some(percentile),
                            values: &values[start..start + n_cells],
                        });
                    }
                }
            }
        }
        layers
    }
}

/// One row of an areal statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArealRow {
    pub area_id: String,
    pub field: String,
    /// Bin label: period identifier or time stamp.
    pub bin: String,
    pub season: String,
    pub percentile: Option<f64>,
    pub statistic: ArealStatistic,
    pub value: f64,
}

/// Weighted spatial mean and standard deviation of every layer of `source`
/// over each area.
///
/// # Errors
///
/// Returns [`ArealError::WeightsLength`] if an area's weights do not match
/// the number of grid cells.
#[tracing::instrument(skip(source, areas), fields(n_areas = areas.len()))]
pub fn areal_statistics<S: ArealSource>(
    source: &S,
    areas: &[AreaWeights],
) -> Result<Vec<ArealRow>, ArealError> {
    let axes = source.axes();
    let n_cells = axes.grid().n_cells();
    for area in areas {
        if area.weights().len() != n_cells {
            return Err(ArealError::WeightsLength {
                area_id: area.area_id().to_string(),
                expected: n_cells,
                got: area.weights().len(),
            });
        }
    }

    let bins = axes.bins().labels();
    let layers = source.layers();
    let mut rows = Vec::with_capacity(areas.len() * layers.len() * 2);
    for area in areas {
        for layer in &layers {
            let (mean, sd) = area.mean_sd(layer.values);
            for (statistic, value) in [(ArealStatistic::Mean, mean), (ArealStatistic::Sd, sd)] {
                rows.push(ArealRow {
                    area_id: area.area_id().to_string(),
                    field: layer.field.clone(),
                    bin: bins[layer.bin].clone(),
                    season: axes.seasons()[layer.season].clone(),
                    percentile: layer.percentile,
                    statistic,
                    value,
                });
            }
        }
    }
    info!(n_rows = rows.len(), "computed areal statistics");
    Ok(rows)
}
