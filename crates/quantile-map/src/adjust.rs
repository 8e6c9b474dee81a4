//! Application of a trained model to a target series.

use kapy_series::{GriddedSeries, SeriesError};
use kapy_stats::{linear_fit, nan_mean, percentile_ranks};
use rayon::prelude::*;
use tracing::info;

use crate::config::{AdjustmentKind, Extrapolation, Interpolation, Method};
use crate::error::QuantileMapError;
use crate::model::{CellModel, GroupFit, QuantileMappingModel, factor_at};

/// Applies `model` to `target`.
///
/// `target` may cover a different (usually longer) period than the training
/// window and may use another calendar; only its months and fractional years
/// are consulted. Values outside the trained range are handled per
/// `extrapolation`, values between nodes per `interpolation`. Cells masked
/// during training, groups never seen in training and missing target values
/// all come out as `NaN`.
///
/// # Errors
///
/// Returns [`QuantileMapError::Series`] wrapping `ShapeMismatch` or
/// `UnitsMismatch` when `target` is not on the model's grid or units, and
/// [`QuantileMapError::EmptyData`] for a target without time steps.
#[tracing::instrument(
    skip(model, target),
    fields(variable = %target.name(), n_time = target.n_time(), method = %model.config().method())
)]
pub fn adjust(
    model: &QuantileMappingModel,
    target: &GriddedSeries,
    extrapolation: Extrapolation,
    interpolation: Interpolation,
) -> Result<GriddedSeries, QuantileMapError> {
    validate_target(model, target)?;

    let config = model.config();
    let grouping = config.grouping();
    let keys: Vec<u8> = target
        .time()
        .months()
        .iter()
        .map(|&m| grouping.key(m))
        .collect();
    let years = target.time().decimal_years();
    let ctx = AdjustContext {
        method: config.method(),
        kind: config.kind(),
        quantiles: model.quantiles(),
        keys: &keys,
        years: &years,
        extrapolation,
        interpolation,
    };

    let cells: Vec<Vec<f64>> = (0..target.n_cells())
        .into_par_iter()
        .map(|c| match model.cell(c) {
            Some(cell_model) => ctx.adjust_cell(cell_model, &target.cell_values(c)),
            None => vec![f64::NAN; target.n_time()],
        })
        .collect();

    let out = GriddedSeries::from_cells(
        target.name(),
        target.units(),
        target.time().clone(),
        target.grid().clone(),
        &cells,
    )?
    .with_attributes(target.attributes().clone());

    info!(n_masked = model.n_masked(), "adjusted series");
    Ok(out)
}

fn validate_target(model: &QuantileMappingModel, target: &GriddedSeries) -> Result<(), QuantileMapError> {
    // 1. Target must have time steps.
    if target.n_time() == 0 {
        return Err(QuantileMapError::EmptyData {
            variable: target.name().to_string(),
        });
    }

    // 2. Grid shape must match the training grid.
    let (left_ny, left_nx) = model.grid().shape();
    let (right_ny, right_nx) = target.grid().shape();
    if (left_ny, left_nx) != (right_ny, right_nx) {
        return Err(SeriesError::ShapeMismatch {
            context: "adjust".to_string(),
            left_ny,
            left_nx,
            right_ny,
            right_nx,
        }
        .into());
    }

    // 3. Units must match the training units.
    if model.units() != target.units() {
        return Err(SeriesError::UnitsMismatch {
            variable: target.name().to_string(),
            expected: model.units().to_string(),
            got: target.units().to_string(),
        }
        .into());
    }

    Ok(())
}

struct AdjustContext<'a> {
    method: Method,
    kind: AdjustmentKind,
    quantiles: &'a [f64],
    keys: &'a [u8],
    years: &'a [f64],
    extrapolation: Extrapolation,
    interpolation: Interpolation,
}

impl AdjustContext<'_> {
    fn adjust_cell(&self, cell: &CellModel, values: &[f64]) -> Vec<f64> {
        let mut out = vec![f64::NAN; values.len()];
        for (&key, fit) in cell.groups() {
            let idx: Vec<usize> = (0..values.len()).filter(|&t| self.keys[t] == key).collect();
            if idx.is_empty() {
                continue;
            }
            let group_values: Vec<f64> = idx.iter().map(|&t| values[t]).collect();
            let corrected = match self.method {
                Method::Eqm => self.map_on_values(fit, &group_values),
                Method::Qdm => self.map_on_ranks(fit, &group_values),
                Method::Dqm => {
                    let group_years: Vec<f64> = idx.iter().map(|&t| self.years[t]).collect();
                    self.map_detrended(fit, &group_values, &group_years)
                }
                Method::Scaling => group_values
                    .iter()
                    .map(|&v| self.kind.apply(v, fit.factors()[0]))
                    .collect(),
            };
            for (&t, v) in idx.iter().zip(corrected) {
                out[t] = v;
            }
        }
        out
    }

    /// Looks up each value on the historical-quantile axis.
    fn map_on_values(&self, fit: &GroupFit, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&v| {
                let af = factor_at(
                    fit.hist_quantiles(),
                    fit.factors(),
                    v,
                    self.extrapolation,
                    self.interpolation,
                );
                self.kind.apply(v, af)
            })
            .collect()
    }

    /// Looks up each value's rank within the group on the quantile axis.
    fn map_on_ranks(&self, fit: &GroupFit, values: &[f64]) -> Vec<f64> {
        percentile_ranks(values)
            .iter()
            .zip(values)
            .map(|(&rank, &v)| {
                let af = factor_at(
                    self.quantiles,
                    fit.factors(),
                    rank,
                    self.extrapolation,
                    self.interpolation,
                );
                self.kind.apply(v, af)
            })
            .collect()
    }

    /// Shifts by the mean correction, removes the group's linear trend over
    /// time, maps the anomalies and puts the trend back.
    fn map_detrended(&self, fit: &GroupFit, values: &[f64], years: &[f64]) -> Vec<f64> {
        let scaled: Vec<f64> = values
            .iter()
            .map(|&v| self.kind.apply(v, fit.scaling()))
            .collect();
        let trend: Vec<f64> = match linear_fit(years, &scaled) {
            Some((slope, intercept)) => years.iter().map(|&x| slope * x + intercept).collect(),
            None => vec![nan_mean(&scaled); scaled.len()],
        };
        let anomalies: Vec<f64> = scaled
            .iter()
            .zip(&trend)
            .map(|(&v, &tr)| self.kind.remove(v, tr))
            .collect();
        self.map_on_values(fit, &anomalies)
            .iter()
            .zip(&trend)
            .map(|(&a, &tr)| self.kind.apply(a, tr))
            .collect()
    }
}
