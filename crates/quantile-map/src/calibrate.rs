//! Calibration of a simulated historical run against a reference dataset.

use kapy_series::{GriddedSeries, match_resolution};
use tracing::info;

use crate::adjust::adjust;
use crate::config::{Extrapolation, Interpolation, QmConfig};
use crate::error::QuantileMapError;
use crate::train::train;

/// Settings of one calibration entry.
///
/// # Example
///
/// ```
/// use kapy_quantile_map::{CalibrationSettings, Method, QmConfig};
///
/// let settings = CalibrationSettings::new("tas_eqm", 1981, 2010)
///     .with_out_variable("tas_bc")
///     .with_config(QmConfig::new().with_method(Method::Eqm));
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationSettings {
    id: String,
    cal_start: i32,
    cal_end: i32,
    out_variable: Option<String>,
    config: QmConfig,
    extrapolation: Extrapolation,
    interpolation: Interpolation,
}

impl CalibrationSettings {
    /// Creates settings for calibrating over `cal_start..=cal_end`.
    ///
    /// Defaults: `out_variable = None` (keep the input name),
    /// `config = QmConfig::new()`, `extrapolation = Constant`,
    /// `interpolation = Nearest`.
    pub fn new(id: impl Into<String>, cal_start: i32, cal_end: i32) -> Self {
        Self {
            id: id.into(),
            cal_start,
            cal_end,
            out_variable: None,
            config: QmConfig::new(),
            extrapolation: Extrapolation::Constant,
            interpolation: Interpolation::Nearest,
        }
    }

    // --- Builder methods ---

    /// Sets the variable name of the calibrated output.
    pub fn with_out_variable(mut self, name: impl Into<String>) -> Self {
        self.out_variable = Some(name.into());
        self
    }

    /// Sets the quantile-mapping configuration.
    pub fn with_config(mut self, config: QmConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the extrapolation policy.
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Sets the interpolation policy.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    // --- Accessors ---

    /// Returns the calibration identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the first calibration year.
    pub fn cal_start(&self) -> i32 {
        self.cal_start
    }

    /// Returns the last calibration year.
    pub fn cal_end(&self) -> i32 {
        self.cal_end
    }

    /// Returns the output variable name, if one is set.
    pub fn out_variable(&self) -> Option<&str> {
        self.out_variable.as_deref()
    }

    /// Returns the quantile-mapping configuration.
    pub fn config(&self) -> &QmConfig {
        &self.config
    }

    /// Returns the extrapolation policy.
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    /// Returns the interpolation policy.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Validates these settings.
    ///
    /// Checks that `cal_start <= cal_end` and that the quantile-mapping
    /// configuration is valid.
    pub fn validate(&self) -> Result<(), QuantileMapError> {
        if self.cal_start > self.cal_end {
            return Err(QuantileMapError::InvalidConfig {
                reason: format!(
                    "calibration '{}': cal_start ({}) must not exceed cal_end ({})",
                    self.id, self.cal_start, self.cal_end
                ),
            });
        }
        self.config.validate()
    }
}

/// Calibrates `hist_sim` against `reference`.
///
/// When one input is monthly and the other daily, the daily one is first
/// resampled to monthly means. Both series are then cut to the calibration
/// years, the simulated slice is moved onto the reference calendar, a model
/// is trained and then applied to the whole of `hist_sim` (which keeps its
/// own calendar). The output is
/// renamed to [`CalibrationSettings::out_variable`] when set and records the
/// method and window in its attributes.
///
/// # Errors
///
/// Returns [`QuantileMapError::InvalidConfig`] for invalid settings and
/// propagates errors of [`train`] and [`adjust`]; in particular a series that
/// does not cover the calibration window yields
/// [`QuantileMapError::EmptyData`] or [`QuantileMapError::PeriodMismatch`].
pub fn calibrate(
    reference: &GriddedSeries,
    hist_sim: &GriddedSeries,
    settings: &CalibrationSettings,
) -> Result<GriddedSeries, QuantileMapError> {
    settings.validate()?;

    let (reference, hist_sim) = match_resolution(reference, hist_sim);
    let ref_cal = reference.slice_years(settings.cal_start, settings.cal_end);
    let hist_cal = hist_sim
        .slice_years(settings.cal_start, settings.cal_end)
        .convert_calendar(reference.calendar());

    let model = train(&ref_cal, &hist_cal, &settings.config)?;
    let adjusted = adjust(
        &model,
        &hist_sim,
        settings.extrapolation,
        settings.interpolation,
    )?;

    let name = settings
        .out_variable
        .clone()
        .unwrap_or_else(|| hist_sim.name().to_string());
    let config = &settings.config;
    let out = adjusted
        .with_name(name)
        .with_attribute("bias_correction_id", settings.id.as_str())
        .with_attribute("bias_correction_method", config.method().name())
        .with_attribute("bias_correction_kind", config.kind().symbol())
        .with_attribute("bias_correction_grouping", config.grouping().name())
        .with_attribute(
            "bias_correction_period",
            format!("{}-{}", settings.cal_start, settings.cal_end),
        );

    info!(
        id = %settings.id,
        variable = %out.name(),
        n_time = out.n_time(),
        "calibrated series"
    );
    Ok(out)
}
