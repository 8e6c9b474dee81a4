//! Training of per-cell, per-group transfer functions.

use std::collections::BTreeMap;

use kapy_series::GriddedSeries;
use kapy_stats::{equally_spaced_nodes, nan_mean, quantile_type7, sorted_valid};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{AdjustmentKind, Method, QmConfig};
use crate::error::QuantileMapError;
use crate::model::{CellModel, GroupFit, QuantileMappingModel};

/// Trains a transfer function mapping `historical` onto `reference`.
///
/// Both series must cover the same calibration years on grids of the same
/// shape and carry the same units. One transfer function is estimated per
/// cell and per group of [`QmConfig::grouping`]; cells are processed in
/// parallel.
///
/// # Errors
///
/// - [`QuantileMapError::InvalidConfig`] for an invalid configuration.
/// - [`QuantileMapError::Series`] wrapping `ShapeMismatch` or
///   `UnitsMismatch` when the series are not comparable.
/// - [`QuantileMapError::EmptyData`] or [`QuantileMapError::PeriodMismatch`]
///   when the calibration windows differ.
/// - [`QuantileMapError::InsufficientData`] when a group of a non-masked
///   cell has fewer valid values than [`QmConfig::min_group_size`].
#[tracing::instrument(
    skip(reference, historical, config),
    fields(variable = %reference.name(), method = %config.method(), grouping = %config.grouping())
)]
pub fn train(
    reference: &GriddedSeries,
    historical: &GriddedSeries,
    config: &QmConfig,
) -> Result<QuantileMappingModel, QuantileMapError> {
    config.validate()?;
    crate::validate_training_inputs(reference, historical)?;

    let grouping = config.grouping();
    let quantiles = equally_spaced_nodes(config.nquantiles());
    let ref_keys: Vec<u8> = reference
        .time()
        .months()
        .iter()
        .map(|&m| grouping.key(m))
        .collect();
    let hist_keys: Vec<u8> = historical
        .time()
        .months()
        .iter()
        .map(|&m| grouping.key(m))
        .collect();

    let cells = (0..reference.n_cells())
        .into_par_iter()
        .map(|c| {
            fit_cell(
                c,
                &reference.cell_values(c),
                &ref_keys,
                &historical.cell_values(c),
                &hist_keys,
                config,
                &quantiles,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let model = QuantileMappingModel::new(
        config.clone(),
        quantiles,
        reference.grid().clone(),
        reference.units().to_string(),
        cells,
    );
    info!(
        n_cells = model.n_cells(),
        n_masked = model.n_masked(),
        "trained quantile mapping"
    );
    Ok(model)
}

fn fit_cell(
    cell: usize,
    reference: &[f64],
    ref_keys: &[u8],
    historical: &[f64],
    hist_keys: &[u8],
    config: &QmConfig,
    quantiles: &[f64],
) -> Result<Option<CellModel>, QuantileMapError> {
    if reference.iter().all(|v| v.is_nan()) || historical.iter().all(|v| v.is_nan()) {
        debug!(cell, "masked cell");
        return Ok(None);
    }

    let grouping = config.grouping();
    let mut keys: Vec<u8> = ref_keys.iter().chain(hist_keys).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut groups = BTreeMap::new();
    for key in keys {
        let ref_group = sorted_valid(&select(reference, ref_keys, key));
        let hist_group = sorted_valid(&select(historical, hist_keys, key));
        let required = config.min_group_size();
        let n_valid = ref_group.len().min(hist_group.len());
        if n_valid < required {
            return Err(QuantileMapError::InsufficientData {
                cell,
                group: grouping.label(key),
                n_valid,
                required,
            });
        }
        groups.insert(key, fit_group(&ref_group, &hist_group, config, quantiles));
    }
    Ok(Some(CellModel::new(groups)))
}

/// Values of `data` whose group key is `key`.
fn select(data: &[f64], keys: &[u8], key: u8) -> Vec<f64> {
    data.iter()
        .zip(keys)
        .filter(|&(_, &k)| k == key)
        .map(|(&v, _)| v)
        .collect()
}

/// Fits one group from sorted, non-empty reference and historical samples.
fn fit_group(
    ref_sorted: &[f64],
    hist_sorted: &[f64],
    config: &QmConfig,
    quantiles: &[f64],
) -> GroupFit {
    let kind = config.kind();
    let neutral = neutral_factor(kind);
    match config.method() {
        Method::Eqm | Method::Qdm => {
            let (hist_q, factors) = quantile_factors(ref_sorted, hist_sorted, kind, quantiles);
            GroupFit::new(hist_q, factors, neutral)
        }
        Method::Dqm => {
            let mu_ref = nan_mean(ref_sorted);
            let mu_hist = nan_mean(hist_sorted);
            // A negative mean flips the order under the multiplicative kind.
            let ref_n = sorted_valid(&normalise(ref_sorted, mu_ref, kind));
            let hist_n = sorted_valid(&normalise(hist_sorted, mu_hist, kind));
            let (hist_q, factors) = quantile_factors(&ref_n, &hist_n, kind, quantiles);
            GroupFit::new(hist_q, factors, kind.factor(mu_ref, mu_hist))
        }
        Method::Scaling => {
            let factor = kind.factor(nan_mean(ref_sorted), nan_mean(hist_sorted));
            GroupFit::new(Vec::new(), vec![factor], neutral)
        }
    }
}

fn normalise(values: &[f64], mean: f64, kind: AdjustmentKind) -> Vec<f64> {
    values.iter().map(|&v| kind.remove(v, mean)).collect()
}

fn quantile_factors(
    ref_sorted: &[f64],
    hist_sorted: &[f64],
    kind: AdjustmentKind,
    quantiles: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    // Multiplicative normalisation by a zero mean leaves nothing to rank.
    if ref_sorted.is_empty() || hist_sorted.is_empty() {
        let nan = vec![f64::NAN; quantiles.len()];
        return (nan.clone(), nan);
    }
    let hist_q: Vec<f64> = quantiles
        .iter()
        .map(|&p| quantile_type7(hist_sorted, p))
        .collect();
    let factors = quantiles
        .iter()
        .zip(&hist_q)
        .map(|(&p, &h)| kind.factor(quantile_type7(ref_sorted, p), h))
        .collect();
    (hist_q, factors)
}

pub(crate) fn neutral_factor(kind: AdjustmentKind) -> f64 {
    match kind {
        AdjustmentKind::Additive => 0.0,
        AdjustmentKind::Multiplicative => 1.0,
    }
}
