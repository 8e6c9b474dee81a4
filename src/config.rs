use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level kapy configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KapyConfig {
    /// Periods used for calibration windows and indicator binning.
    #[serde(default)]
    pub periods: Vec<PeriodToml>,

    /// Season table; `all` is always available.
    #[serde(default)]
    pub seasons: Vec<SeasonToml>,

    /// Declared input variables and their units.
    #[serde(default)]
    pub inputs: Vec<InputToml>,

    /// Bias-correction settings keyed by calibration id.
    #[serde(default)]
    pub calibration: BTreeMap<String, CalibrationToml>,

    /// Derived variables keyed by output variable id.
    #[serde(default)]
    pub derived: BTreeMap<String, DerivedToml>,

    /// Indicator definitions keyed by indicator id.
    #[serde(default)]
    pub indicators: BTreeMap<String, IndicatorToml>,

    /// Ensemble settings.
    #[serde(default)]
    pub ensemble: EnsembleToml,

    /// Areal statistics settings.
    #[serde(default)]
    pub areal: ArealToml,

    /// Checkpoint encoding.
    #[serde(default)]
    pub output: OutputToml,
}

impl KapyConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodToml {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonToml {
    pub id: String,
    /// Calendar months; empty means all twelve.
    #[serde(default)]
    pub months: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputToml {
    pub variable: String,
    pub units: String,
    /// Free-form origin, e.g. a model or dataset name.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationToml {
    pub cal_start: i32,
    pub cal_end: i32,
    #[serde(default)]
    pub out_variable: Option<String>,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_grouping")]
    pub grouping: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_nquantiles")]
    pub nquantiles: usize,
    #[serde(default = "default_extrapolation")]
    pub extrapolation: String,
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
}

fn default_method() -> String {
    "eqm".to_string()
}
fn default_grouping() -> String {
    "month".to_string()
}
fn default_kind() -> String {
    "+".to_string()
}
fn default_nquantiles() -> usize {
    20
}
fn default_extrapolation() -> String {
    "constant".to_string()
}
fn default_interpolation() -> String {
    "nearest".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedToml {
    /// Registered processor, e.g. `diurnal_range`.
    pub processor: String,
    /// Extra arguments handed to the processor.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorToml {
    /// Input variable the indicator is computed from.
    pub variable: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default = "default_statistic")]
    pub statistic: String,
    /// Comparison operator of `count`.
    #[serde(default)]
    pub op: Option<String>,
    /// Threshold of `count`; a number or a numeric string.
    #[serde(default)]
    pub threshold: Option<toml::Value>,
    /// Registered name of a `custom` statistic.
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default = "default_seasons")]
    pub seasons: Vec<String>,
    #[serde(default = "default_time_binning")]
    pub time_binning: String,
    #[serde(default = "default_delta_type")]
    pub delta_type: String,
}

fn default_statistic() -> String {
    "mean".to_string()
}
fn default_seasons() -> Vec<String> {
    vec!["all".to_string()]
}
fn default_time_binning() -> String {
    "periods".to_string()
}
fn default_delta_type() -> String {
    "subtract".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnsembleToml {
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
}

impl Default for EnsembleToml {
    fn default() -> Self {
        Self {
            percentiles: default_percentiles(),
        }
    }
}

fn default_percentiles() -> Vec<f64> {
    vec![10.0, 50.0, 90.0]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArealToml {
    /// `cos_lat` or `uniform`.
    #[serde(default = "default_weighting")]
    pub weighting: String,
    /// Also report the whole grid as area `all`.
    #[serde(default = "default_true")]
    pub whole_domain: bool,
    /// Named masks over the grid cells, row-major.
    #[serde(default)]
    pub areas: Vec<AreaToml>,
}

impl Default for ArealToml {
    fn default() -> Self {
        Self {
            weighting: default_weighting(),
            whole_domain: true,
            areas: Vec::new(),
        }
    }
}

fn default_weighting() -> String {
    "cos_lat".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaToml {
    pub id: String,
    pub mask: Vec<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    #[serde(default)]
    pub pretty: bool,
    #[serde(default)]
    pub decimals: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: KapyConfig = toml::from_str(
            r#"
            [[periods]]
            id = "ref"
            start = 1981
            end = 2010

            [indicators.tas_mean]
            variable = "tas"
            "#,
        )
        .unwrap();
        assert_eq!(config.periods[0].name, None);
        let ind = &config.indicators["tas_mean"];
        assert_eq!(ind.statistic, "mean");
        assert_eq!(ind.seasons, vec!["all"]);
        assert_eq!(ind.delta_type, "subtract");
        assert_eq!(config.ensemble.percentiles, vec![10.0, 50.0, 90.0]);
        assert_eq!(config.areal.weighting, "cos_lat");
        assert!(config.areal.whole_domain);
    }

    #[test]
    fn calibration_table_by_id() {
        let config: KapyConfig = toml::from_str(
            r#"
            [calibration.tas_eqm]
            cal_start = 1981
            cal_end = 2010
            method = "xclim-dqm"
            "#,
        )
        .unwrap();
        let cal = &config.calibration["tas_eqm"];
        assert_eq!(cal.method, "xclim-dqm");
        assert_eq!(cal.grouping, "month");
        assert_eq!(cal.nquantiles, 20);
        assert_eq!(cal.extrapolation, "constant");
    }

    #[test]
    fn unknown_field_rejected() {
        let parsed = toml::from_str::<KapyConfig>(
            r#"
            [ensemble]
            percentiles = [50.0]
            quantiles = [0.5]
            "#,
        );
        assert!(parsed.is_err());
    }
}
