//! Joint correction of daily mean, maximum and minimum temperature.
//!
//! The three fields are decomposed into the mean (`tmean = tas`), the
//! diurnal range (`dtr = tasmax - tasmin`) and the skewness parameter
//! (`z = tas - (tasmax + tasmin) / 2`). Each component is corrected on its
//! own and the extremes are rebuilt as
//! `tasmax = tmean - z + dtr / 2` and `tasmin = tmean - z - dtr / 2`.

use kapy_series::GriddedSeries;
use tracing::info;

use crate::adjust::adjust;
use crate::config::{Extrapolation, Interpolation, QmConfig};
use crate::error::QuantileMapError;
use crate::train::train;

/// Matching `tas`, `tasmax` and `tasmin` series.
#[derive(Debug, Clone)]
pub struct TemperatureSeries {
    tas: GriddedSeries,
    tasmax: GriddedSeries,
    tasmin: GriddedSeries,
}

impl TemperatureSeries {
    /// Bundles the three fields.
    ///
    /// # Errors
    ///
    /// Returns [`QuantileMapError::Series`] if the fields differ in grid
    /// shape, number of time steps or units.
    pub fn new(
        tas: GriddedSeries,
        tasmax: GriddedSeries,
        tasmin: GriddedSeries,
    ) -> Result<Self, QuantileMapError> {
        for other in [&tasmax, &tasmin] {
            tas.zip_with(other, "temperature triple", |a, _| a)?;
            tas.check_units(other)?;
        }
        Ok(Self { tas, tasmax, tasmin })
    }

    /// Daily mean temperature.
    pub fn tas(&self) -> &GriddedSeries {
        &self.tas
    }

    /// Daily maximum temperature.
    pub fn tasmax(&self) -> &GriddedSeries {
        &self.tasmax
    }

    /// Daily minimum temperature.
    pub fn tasmin(&self) -> &GriddedSeries {
        &self.tasmin
    }

    /// Returns `true` if the fields have at most one step per month.
    pub fn is_monthly(&self) -> bool {
        self.tas.is_monthly()
    }

    /// The triple at monthly resolution (see [`GriddedSeries::to_monthly`]).
    pub fn to_monthly(&self) -> Self {
        Self {
            tas: self.tas.to_monthly(),
            tasmax: self.tasmax.to_monthly(),
            tasmin: self.tasmin.to_monthly(),
        }
    }

    /// Splits the triple into mean, diurnal range and skewness.
    pub fn decompose(&self) -> Result<TemperatureComponents, QuantileMapError> {
        let dtr = self
            .tasmax
            .zip_with(&self.tasmin, "dtr", |hi, lo| hi - lo)?
            .with_name("dtr");
        let mid = self
            .tasmax
            .zip_with(&self.tasmin, "z", |hi, lo| (hi + lo) / 2.0)?;
        let z = self
            .tas
            .zip_with(&mid, "z", |mean, mid| mean - mid)?
            .with_name("z");
        Ok(TemperatureComponents {
            tmean: self.tas.clone(),
            dtr,
            z,
        })
    }
}

/// Mean, diurnal range and skewness components of a temperature triple.
#[derive(Debug, Clone)]
pub struct TemperatureComponents {
    tmean: GriddedSeries,
    dtr: GriddedSeries,
    z: GriddedSeries,
}

impl TemperatureComponents {
    /// Mean temperature.
    pub fn tmean(&self) -> &GriddedSeries {
        &self.tmean
    }

    /// Diurnal temperature range.
    pub fn dtr(&self) -> &GriddedSeries {
        &self.dtr
    }

    /// Skewness parameter.
    pub fn z(&self) -> &GriddedSeries {
        &self.z
    }

    /// Rebuilds `(tasmax, tasmin)`; negative ranges are clamped to zero first.
    pub fn reconstruct(&self) -> Result<(GriddedSeries, GriddedSeries), QuantileMapError> {
        let dtr = self.dtr.map(clamp_range);
        let centre = self.tmean.zip_with(&self.z, "reconstruct", |m, z| m - z)?;
        let tasmax = centre
            .zip_with(&dtr, "reconstruct", |c, d| c + d / 2.0)?
            .with_name("tasmax");
        let tasmin = centre
            .zip_with(&dtr, "reconstruct", |c, d| c - d / 2.0)?
            .with_name("tasmin");
        Ok((tasmax, tasmin))
    }
}

/// Output of [`correct_temperature`].
#[derive(Debug, Clone)]
pub struct CorrectedTemperature {
    tas: GriddedSeries,
    tasmax: GriddedSeries,
    tasmin: GriddedSeries,
}

impl CorrectedTemperature {
    /// Corrected mean temperature.
    pub fn tas(&self) -> &GriddedSeries {
        &self.tas
    }

    /// Corrected maximum temperature.
    pub fn tasmax(&self) -> &GriddedSeries {
        &self.tasmax
    }

    /// Corrected minimum temperature.
    pub fn tasmin(&self) -> &GriddedSeries {
        &self.tasmin
    }
}

/// Corrects a temperature triple through its mean, range and skewness.
///
/// Each component of `historical` is trained against the same component of
/// `reference` with `config` (usually [`QmConfig::temperature`]) and applied
/// to the matching component of `target` with constant extrapolation and
/// nearest-node lookup. The corrected diurnal range is clamped at zero
/// before the extremes are rebuilt.
///
/// # Errors
///
/// Propagates training and adjustment errors, and returns
/// [`QuantileMapError::PhysicalConsistency`] if any rebuilt `tasmax` is below
/// its `tasmin`.
#[tracing::instrument(skip(reference, historical, target, config), fields(model_id = %model_id))]
pub fn correct_temperature(
    model_id: &str,
    reference: &TemperatureSeries,
    historical: &TemperatureSeries,
    target: &TemperatureSeries,
    config: &QmConfig,
) -> Result<CorrectedTemperature, QuantileMapError> {
    // A monthly training pair corrects monthly targets.
    let (reference, historical, target) = if reference.is_monthly() || historical.is_monthly() {
        (reference.to_monthly(), historical.to_monthly(), target.to_monthly())
    } else {
        (reference.clone(), historical.clone(), target.clone())
    };
    let reference = reference.decompose()?;
    let historical = historical.decompose()?;
    let target = target.decompose()?;

    let correct = |r: &GriddedSeries,
                   h: &GriddedSeries,
                   t: &GriddedSeries|
     -> Result<GriddedSeries, QuantileMapError> {
        let model = train(r, h, config)?;
        adjust(&model, t, Extrapolation::Constant, Interpolation::Nearest)
    };
    let corrected = TemperatureComponents {
        tmean: correct(reference.tmean(), historical.tmean(), target.tmean())?,
        dtr: correct(reference.dtr(), historical.dtr(), target.dtr())?.map(clamp_range),
        z: correct(reference.z(), historical.z(), target.z())?,
    };

    let (tasmax, tasmin) = corrected.reconstruct()?;
    let tasmax = tasmax.with_attributes(target.tmean().attributes().clone());
    let tasmin = tasmin.with_attributes(target.tmean().attributes().clone());
    check_tmax_tmin(model_id, &tasmax, &tasmin)?;

    info!(n_time = tasmax.n_time(), "corrected temperature triple");
    Ok(CorrectedTemperature {
        tas: corrected.tmean,
        tasmax,
        tasmin,
    })
}

/// Fails if `tasmax < tasmin` anywhere; missing values are skipped.
///
/// # Errors
///
/// Returns [`QuantileMapError::PhysicalConsistency`] with the number of
/// violating points and the distinct cells involved, or
/// [`QuantileMapError::Series`] if the two series are not aligned.
pub fn check_tmax_tmin(
    model_id: &str,
    tasmax: &GriddedSeries,
    tasmin: &GriddedSeries,
) -> Result<(), QuantileMapError> {
    tasmax.zip_with(tasmin, "tasmax/tasmin check", |a, _| a)?;
    let n_cells = tasmax.n_cells();
    let mut cells = Vec::new();
    let mut n_violations = 0;
    for (i, (&hi, &lo)) in tasmax.values().iter().zip(tasmin.values()).enumerate() {
        if hi < lo {
            n_violations += 1;
            cells.push(i % n_cells);
        }
    }
    if n_violations > 0 {
        cells.sort_unstable();
        cells.dedup();
        return Err(QuantileMapError::PhysicalConsistency {
            model_id: model_id.to_string(),
            n_violations,
            cells,
        });
    }
    Ok(())
}

fn clamp_range(dtr: f64) -> f64 {
    if dtr < 0.0 { 0.0 } else { dtr }
}
