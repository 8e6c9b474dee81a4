//! Combination of member indicator results along the member axis.

use std::collections::BTreeMap;

use kapy_indicators::{IndicatorAxes, IndicatorResult};
use kapy_series::Grid;
use kapy_stats::{count_valid, nan_mean, nan_std, quantile_type7, sorted_valid};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::EnsembleConfig;
use crate::error::EnsembleError;

/// Names of the per-position statistics, in output order.
const STATISTICS: [&str; 5] = ["count", "max", "mean", "min", "stdev"];

/// Ensemble statistics of one indicator.
///
/// Fields are named `<source>_<statistic>` with source `indicator` or
/// `delta` and statistic `count`, `max`, `mean`, `min`, `stdev` or
/// `percentiles`. Plain statistics share the member layout
/// `[bin][season][cell]`; percentile fields are laid out
/// `[bin][season][percentile][cell]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStatistics {
    id: String,
    units: String,
    axes: IndicatorAxes,
    percentiles: Vec<f64>,
    n_members: usize,
    fields: BTreeMap<String, Vec<f64>>,
    attributes: BTreeMap<String, String>,
}

impl EnsembleStatistics {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// Axes of the members, with grid coordinates averaged across members.
    pub fn axes(&self) -> &IndicatorAxes {
        &self.axes
    }

    /// Percentiles of the `*_percentiles` fields, ascending.
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn n_members(&self) -> usize {
        self.n_members
    }

    /// All fields, sorted by name.
    pub fn fields(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.fields
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Value of a plain statistic field at `(bin, season, cell)`.
    pub fn value(&self, name: &str, bin: usize, season: usize, cell: usize) -> Option<f64> {
        self.field(name).map(|f| f[self.axes.index(bin, season, cell)])
    }

    /// Value of a percentile field at `(bin, season, percentile, cell)`.
    pub fn percentile_value(
        &self,
        name: &str,
        bin: usize,
        season: usize,
        percentile: usize,
        cell: usize,
    ) -> Option<f64> {
        let (_, n_seasons, n_cells) = self.axes.shape();
        let n_pct = self.percentiles.len();
        self.field(name)
            .map(|f| f[((bin * n_seasons + season) * n_pct + percentile) * n_cells + cell])
    }

    /// Attributes shared by every member.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Combines member results into ensemble statistics.
///
/// Every position of the indicator and delta cubes is reduced over members
/// independently (in parallel); missing member values are skipped and
/// counted. Member values are sorted before reduction, so the output does not
/// depend on member order.
///
/// # Errors
///
/// - [`EnsembleError::InvalidPercentile`] for an invalid configuration.
/// - [`EnsembleError::EmptyEnsemble`] without members.
/// - [`EnsembleError::ShapeMismatch`], [`EnsembleError::AxisMismatch`] or
///   [`EnsembleError::UnitsMismatch`] when members are not comparable.
#[tracing::instrument(skip(members, config), fields(n_members = members.len()))]
pub fn combine_ensemble(
    members: &[IndicatorResult],
    config: &EnsembleConfig,
) -> Result<EnsembleStatistics, EnsembleError> {
    config.validate()?;
    crate::validate_members(members)?;
    let first = &members[0];

    let mut fields = BTreeMap::new();
    let indicator: Vec<&[f64]> = members.iter().map(|m| m.indicator_values()).collect();
    reduce_source("indicator", &indicator, first.axes(), config.percentiles(), &mut fields);
    let delta: Vec<&[f64]> = members.iter().map(|m| m.delta_values()).collect();
    reduce_source("delta", &delta, first.axes(), config.percentiles(), &mut fields);

    let axes = IndicatorAxes::new(
        first.axes().bins().clone(),
        first.axes().seasons().to_vec(),
        mean_grid(members),
    );
    let attributes = shared_attributes(members);
    debug!(n_shared = attributes.len(), "reconciled member attributes");

    let stats = EnsembleStatistics {
        id: first.id().to_string(),
        units: first.units().to_string(),
        axes,
        percentiles: config.percentiles().to_vec(),
        n_members: members.len(),
        fields,
        attributes,
    };
    info!(n_fields = stats.fields.len(), "combined ensemble");
    Ok(stats)
}

/// Per-position summary over members.
struct PositionStats {
    plain: [f64; STATISTICS.len()],
    percentiles: Vec<f64>,
}

fn summarise(values: &[f64], percentiles: &[f64]) -> PositionStats {
    let sorted = sorted_valid(values);
    if sorted.is_empty() {
        let mut plain = [f64::NAN; STATISTICS.len()];
        plain[0] = 0.0;
        return PositionStats {
            plain,
            percentiles: vec![f64::NAN; percentiles.len()],
        };
    }
    // Reduce the sorted values so sums do not depend on member order.
    PositionStats {
        plain: [
            count_valid(values) as f64,
            sorted[sorted.len() - 1],
            nan_mean(&sorted),
            sorted[0],
            nan_std(&sorted),
        ],
        percentiles: percentiles
            .iter()
            .map(|p| quantile_type7(&sorted, p / 100.0))
            .collect(),
    }
}

fn reduce_source(
    source: &str,
    cubes: &[&[f64]],
    axes: &IndicatorAxes,
    percentiles: &[f64],
    fields: &mut BTreeMap<String, Vec<f64>>,
) {
    let (n_bins, n_seasons, n_cells) = axes.shape();
    let summaries: Vec<PositionStats> = (0..axes.len())
        .into_par_iter()
        .map(|i| {
            let values: Vec<f64> = cubes.iter().map(|c| c[i]).collect();
            summarise(&values, percentiles)
        })
        .collect();

    for (k, stat) in STATISTICS.iter().enumerate() {
        fields.insert(
            format!("{source}_{stat}"),
            summaries.iter().map(|s| s.plain[k]).collect(),
        );
    }

    let n_pct = percentiles.len();
    let mut pct = Vec::with_capacity(axes.len() * n_pct);
    for row in 0..n_bins * n_seasons {
        for p in 0..n_pct {
            pct.extend((0..n_cells).map(|c| summaries[row * n_cells + c].percentiles[p]));
        }
    }
    fields.insert(format!("{source}_percentiles"), pct);
}

/// Grid whose coordinates are the member average.
///
/// Members are known to share the grid shape.
fn mean_grid(members: &[IndicatorResult]) -> Grid {
    let average = |coords: fn(&Grid) -> &[f64]| -> Vec<f64> {
        let len = coords(members[0].axes().grid()).len();
        (0..len)
            .map(|i| {
                let values: Vec<f64> =
                    members.iter().map(|m| coords(m.axes().grid())[i]).collect();
                nan_mean(&sorted_valid(&values))
            })
            .collect()
    };
    Grid::new(average(Grid::lats), average(Grid::lons))
}

/// Attributes with the same value in every member.
fn shared_attributes(members: &[IndicatorResult]) -> BTreeMap<String, String> {
    let mut shared = members[0].attributes().clone();
    for m in &members[1..] {
        shared.retain(|k, v| m.attributes().get(k) == Some(v));
    }
    shared
}
