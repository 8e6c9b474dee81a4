//! Binning of a series into indicator and delta cubes.

use std::collections::BTreeMap;

use kapy_calendar::{Calendar, CfDate};
use kapy_series::{GriddedSeries, TimeAxis};
use kapy_stats::nan_mean;
use tracing::{debug, info};

use crate::definition::{IndicatorContext, IndicatorDefinition, TimeBinning};
use crate::error::IndicatorError;
use crate::period::Period;
use crate::result::{BinAxis, IndicatorAxes, IndicatorResult};
use crate::statistic::Statistic;

/// Time steps falling into one bin, before season filtering.
struct Bin {
    indices: Vec<usize>,
    /// Whether the bin counts towards the delta reference.
    in_reference: bool,
}

/// Builds one indicator from `series`.
///
/// For every bin of [`IndicatorDefinition::time_binning`] and every requested
/// season, the time steps in both are reduced with the definition's
/// statistic. A bin with no time steps yields `NaN` for all cells. Deltas are
/// taken against the first period: its own bin in periods mode, or the mean
/// of the bins inside it in years and months mode.
///
/// # Errors
///
/// Configuration errors from [`IndicatorContext::check`], and
/// [`IndicatorError::CustomStatisticFailed`] when a custom statistic fails or
/// returns the wrong number of values.
#[tracing::instrument(
    skip(series, definition, context),
    fields(id = %definition.id(), binning = %definition.time_binning(), variable = %series.name())
)]
pub fn build_indicator(
    series: &GriddedSeries,
    definition: &IndicatorDefinition,
    context: &IndicatorContext,
) -> Result<IndicatorResult, IndicatorError> {
    let seasons = context.check(definition)?;
    // `check` guarantees at least one period.
    let reference_period = &context.periods()[0];

    let (bin_axis, bins) = assign_bins(series, definition.time_binning(), context.periods(), reference_period)?;
    let axes = IndicatorAxes::new(
        bin_axis,
        seasons.iter().map(|s| s.id().to_string()).collect(),
        series.grid().clone(),
    );
    let n_cells = series.n_cells();
    let months = series.time().months();
    let years = series.time().years();

    let mut indicator = Vec::with_capacity(axes.len());
    let mut n_empty = 0;
    for bin in &bins {
        for season in &seasons {
            let idx: Vec<usize> = bin
                .indices
                .iter()
                .copied()
                .filter(|&t| season.contains(months[t]))
                .collect();
            if idx.is_empty() {
                n_empty += 1;
                indicator.extend(std::iter::repeat_n(f64::NAN, n_cells));
                continue;
            }
            let cells = reduce_slice(series, &idx, &years, definition, context)?;
            indicator.extend(cells);
        }
    }
    if n_empty > 0 {
        debug!(n_empty, "empty bins filled with NaN");
    }

    let reference = reference_cube(&indicator, &bins, seasons.len(), n_cells);
    let delta_type = definition.delta_type();
    let delta: Vec<f64> = indicator
        .chunks(n_cells.max(1))
        .enumerate()
        .flat_map(|(row, chunk)| {
            let season = row % seasons.len();
            let reference = &reference[season * n_cells..(season + 1) * n_cells];
            chunk
                .iter()
                .zip(reference)
                .map(|(&v, &r)| delta_type.apply(v, r))
                .collect::<Vec<_>>()
        })
        .collect();

    let units = definition.units().unwrap_or(series.units()).to_string();
    let mut attributes = definition.attributes();
    attributes.insert("source_variable".to_string(), series.name().to_string());

    let result = IndicatorResult::new(
        definition.id(),
        units,
        axes,
        indicator,
        delta,
        reference,
        delta_type,
    )?
    .with_attributes(attributes);

    info!(
        n_bins = bins.len(),
        n_seasons = seasons.len(),
        n_empty,
        "built indicator"
    );
    Ok(result)
}

/// Maps each time step to its bin and builds the bin axis.
fn assign_bins(
    series: &GriddedSeries,
    binning: TimeBinning,
    periods: &[Period],
    reference_period: &Period,
) -> Result<(BinAxis, Vec<Bin>), IndicatorError> {
    let dates = series.time().dates();
    match binning {
        TimeBinning::Periods => {
            let bins = periods
                .iter()
                .enumerate()
                .map(|(i, p)| Bin {
                    indices: series.time().indices_in_years(p.start(), p.end()),
                    in_reference: i == 0,
                })
                .collect();
            let ids = periods.iter().map(|p| p.id().to_string()).collect();
            Ok((BinAxis::Periods(ids), bins))
        }
        TimeBinning::Years | TimeBinning::Months => {
            let stamp = |d: CfDate| match binning {
                TimeBinning::Months => d.mid_month(),
                _ => d.first_of_year(),
            };
            let mut grouped: BTreeMap<CfDate, Vec<usize>> = BTreeMap::new();
            for (t, &d) in dates.iter().enumerate() {
                grouped.entry(stamp(d)).or_default().push(t);
            }
            let stamps: Vec<CfDate> = grouped.keys().copied().collect();
            let bins = grouped
                .into_iter()
                .map(|(stamp, indices)| Bin {
                    indices,
                    in_reference: reference_period.contains(stamp.year()),
                })
                .collect();
            // Canonical stamps exist in every calendar, so bins from
            // differently-calendared inputs line up.
            let axis = TimeAxis::new(Calendar::Standard, stamps)?;
            Ok((BinAxis::Times(axis), bins))
        }
    }
}

/// Reduces the time steps `idx` of every cell.
fn reduce_slice(
    series: &GriddedSeries,
    idx: &[usize],
    years: &[i32],
    definition: &IndicatorDefinition,
    context: &IndicatorContext,
) -> Result<Vec<f64>, IndicatorError> {
    let n_cells = series.n_cells();
    if let Statistic::Custom { name } = definition.statistic() {
        let failed = |reason: String| IndicatorError::CustomStatisticFailed {
            indicator_id: definition.id().to_string(),
            reason,
        };
        let statistic = context
            .registry()
            .get(name)
            .ok_or_else(|| IndicatorError::UnknownStatistic { name: name.clone() })?;
        let out = statistic.evaluate(&series.select_times(idx)).map_err(failed)?;
        if out.len() != n_cells {
            return Err(failed(format!(
                "returned {} values for {n_cells} cells",
                out.len()
            )));
        }
        return Ok(out);
    }

    let bin_years: Vec<i32> = idx.iter().map(|&t| years[t]).collect();
    let values = series.values();
    Ok((0..n_cells)
        .map(|c| {
            let cell: Vec<f64> = idx.iter().map(|&t| values[t * n_cells + c]).collect();
            definition.statistic().reduce(&cell, &bin_years)
        })
        .collect())
}

/// Per `(season, cell)` mean over the reference bins.
fn reference_cube(indicator: &[f64], bins: &[Bin], n_seasons: usize, n_cells: usize) -> Vec<f64> {
    let mut reference = Vec::with_capacity(n_seasons * n_cells);
    for s in 0..n_seasons {
        for c in 0..n_cells {
            let values: Vec<f64> = bins
                .iter()
                .enumerate()
                .filter(|(_, bin)| bin.in_reference)
                .map(|(b, _)| indicator[(b * n_seasons + s) * n_cells + c])
                .collect();
            reference.push(nan_mean(&values));
        }
    }
    reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DeltaType;
    use approx::assert_relative_eq;
    use kapy_series::Grid;

    fn monthly(start_year: i32, values: Vec<f64>) -> GriddedSeries {
        let start = CfDate::new(Calendar::NoLeap, start_year, 1, 1).unwrap();
        let time = TimeAxis::monthly(Calendar::NoLeap, start, values.len());
        GriddedSeries::new("tas", "K", time, Grid::with_shape(1, 1), values).unwrap()
    }

    fn three_periods() -> IndicatorContext {
        IndicatorContext::new(vec![
            Period::new("p1", "First", 2000, 2000).unwrap(),
            Period::new("p2", "Second", 2001, 2001).unwrap(),
            Period::new("p3", "Third", 2002, 2002).unwrap(),
        ])
    }

    fn stepped() -> GriddedSeries {
        // 10 all of 2000, 20 in 2001, 30 in 2002.
        monthly(2000, (0..36).map(|i| 10.0 * (1 + i / 12) as f64).collect())
    }

    #[test]
    fn subtract_delta_against_first_period() {
        let def = IndicatorDefinition::new("1", Statistic::Mean);
        let r = build_indicator(&stepped(), &def, &three_periods()).unwrap();
        let ind: Vec<f64> = (0..3).map(|b| r.indicator(b, 0, 0)).collect();
        let delta: Vec<f64> = (0..3).map(|b| r.delta(b, 0, 0)).collect();
        assert_eq!(ind, vec![10.0, 20.0, 30.0]);
        assert_eq!(delta, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn divide_delta_against_first_period() {
        let def = IndicatorDefinition::new("1", Statistic::Mean).with_delta_type(DeltaType::Divide);
        let r = build_indicator(&stepped(), &def, &three_periods()).unwrap();
        let delta: Vec<f64> = (0..3).map(|b| r.delta(b, 0, 0)).collect();
        assert_eq!(delta, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn years_mode_reference_is_mean_of_first_period() {
        let context = IndicatorContext::new(vec![Period::new("ref", "Ref", 2000, 2001).unwrap()]);
        let def = IndicatorDefinition::new("1", Statistic::Mean).with_time_binning(TimeBinning::Years);
        let r = build_indicator(&stepped(), &def, &context).unwrap();
        assert_eq!(r.axes().shape(), (3, 1, 1));
        assert_relative_eq!(r.reference(0, 0), 15.0);
        assert_relative_eq!(r.delta(2, 0, 0), 15.0);
        assert_eq!(r.axes().bins().labels(), vec!["2000-01-01", "2001-01-01", "2002-01-01"]);
    }

    #[test]
    fn months_mode_stamps_the_15th() {
        let def = IndicatorDefinition::new("1", Statistic::Max).with_time_binning(TimeBinning::Months);
        let r = build_indicator(&monthly(2000, vec![1.0, 2.0]), &def, &three_periods()).unwrap();
        match r.axes().bins() {
            BinAxis::Times(axis) => {
                assert_eq!(axis.calendar(), Calendar::Standard);
                assert!(axis.dates().iter().all(|d| d.day() == 15));
            }
            other => panic!("expected time bins, got {other:?}"),
        }
    }

    #[test]
    fn custom_statistic_failure_is_wrapped() {
        let registry = crate::StatisticRegistry::new().register(
            "broken",
            |_: &GriddedSeries| -> Result<Vec<f64>, String> { Err("no spells".to_string()) },
        );
        let context = three_periods().with_registry(registry);
        let def = IndicatorDefinition::new(
            "spell",
            Statistic::Custom {
                name: "broken".into(),
            },
        );
        assert!(matches!(
            build_indicator(&stepped(), &def, &context),
            Err(IndicatorError::CustomStatisticFailed { indicator_id, reason })
                if indicator_id == "spell" && reason == "no spells"
        ));
    }
}
