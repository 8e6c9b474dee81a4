//! Empirical, detrended and delta quantile mapping for gridded climate series.
//!
//! This crate corrects climate-model output against an observational
//! reference by matching distributions per grid cell and per time group.
//!
//! # Pipeline
//!
//! 1. **Train** one transfer function per cell and group (month, season or
//!    the whole series) from paired reference and historical-model series
//!    covering the same calibration years
//! 2. **Adjust** any target series of the same grid (usually longer, into the
//!    future) by looking up the correction of each value's nearest node
//! 3. For temperature, **decompose** `tas`/`tasmax`/`tasmin` into mean,
//!    diurnal range and skewness, correct each and **rebuild** the extremes
//!
//! Values outside the trained range take the boundary node's correction
//! (constant extrapolation). Missing values and masked cells stay `NaN`.
//!
//! # Glossary
//!
//! - **EQM**: empirical quantile mapping, corrections indexed by the
//!   historical-model value
//! - **DQM**: detrended quantile mapping, mean-shifted and detrended before
//!   mapping, trend restored afterwards
//! - **QDM**: quantile delta mapping, corrections indexed by the target
//!   value's rank within its own group
//! - **Scaling**: one additive or multiplicative factor per group
//! - **DTR**: diurnal temperature range (`tasmax - tasmin`)
//!
//! # Quick Start
//!
//! ```no_run
//! use kapy_calendar::{Calendar, CfDate};
//! use kapy_quantile_map::{Extrapolation, Interpolation, QmConfig, adjust, train};
//! use kapy_series::{Grid, GriddedSeries, TimeAxis};
//!
//! let start = CfDate::new(Calendar::NoLeap, 1991, 1, 1).unwrap();
//! let time = TimeAxis::daily(Calendar::NoLeap, start, 3650);
//! let grid = Grid::with_shape(1, 1);
//! let obs = GriddedSeries::new("tas", "K", time.clone(), grid.clone(), vec![280.0; 3650]).unwrap();
//! let sim = GriddedSeries::new("tas", "K", time, grid, vec![278.5; 3650]).unwrap();
//!
//! let model = train(&obs, &sim, &QmConfig::new()).unwrap();
//! let corrected = adjust(&model, &sim, Extrapolation::Constant, Interpolation::Nearest).unwrap();
//! ```

mod adjust;
mod calibrate;
mod config;
mod error;
mod model;
mod temperature;
mod train;

pub use adjust::adjust;
pub use calibrate::{CalibrationSettings, calibrate};
pub use config::{AdjustmentKind, Extrapolation, Grouping, Interpolation, Method, QmConfig};
pub use error::QuantileMapError;
pub use model::{CellModel, GroupFit, QuantileMappingModel};
pub use temperature::{
    CorrectedTemperature, TemperatureComponents, TemperatureSeries, check_tmax_tmin,
    correct_temperature,
};
pub use train::train;

use kapy_series::GriddedSeries;

/// Validates the inputs to [`train`].
fn validate_training_inputs(
    reference: &GriddedSeries,
    historical: &GriddedSeries,
) -> Result<(), QuantileMapError> {
    // 1. Neither series may be empty.
    for series in [reference, historical] {
        if series.n_time() == 0 {
            return Err(QuantileMapError::EmptyData {
                variable: series.name().to_string(),
            });
        }
    }

    // 2. Spatial shapes must agree.
    reference.check_same_grid(historical, "train")?;

    // 3. Units must agree.
    reference.check_units(historical)?;

    // 4. Both must cover the same calibration years.
    if let (Some((rs, re)), Some((hs, he))) =
        (reference.time().year_range(), historical.time().year_range())
        && (rs, re) != (hs, he)
    {
        return Err(QuantileMapError::PeriodMismatch {
            reference_start: rs,
            reference_end: re,
            historical_start: hs,
            historical_end: he,
        });
    }

    Ok(())
}
