//! Configuration for quantile mapping.

use std::fmt;
use std::str::FromStr;

use crate::error::QuantileMapError;

/// Calibration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// Empirical quantile mapping: matches the full distribution.
    #[default]
    Eqm,
    /// Detrended quantile mapping: removes a per-group linear trend before
    /// mapping and reinjects it afterwards.
    Dqm,
    /// Quantile delta mapping: the target value's rank within its own group
    /// selects the correction.
    Qdm,
    /// One additive or multiplicative factor per group.
    Scaling,
}

impl Method {
    /// Returns the canonical name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Method::Eqm => "eqm",
            Method::Dqm => "dqm",
            Method::Qdm => "qdm",
            Method::Scaling => "scaling",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = QuantileMapError;

    /// Accepts the canonical names and their `xclim-` prefixed forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.strip_prefix("xclim-").unwrap_or(key.as_str()) {
            "eqm" => Ok(Method::Eqm),
            "dqm" => Ok(Method::Dqm),
            "qdm" => Ok(Method::Qdm),
            "scaling" => Ok(Method::Scaling),
            _ => Err(QuantileMapError::UnsupportedMethod {
                name: s.to_string(),
            }),
        }
    }
}

/// Time unit over which separate transfer functions are trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Grouping {
    /// One transfer function for the whole series.
    None,
    /// One transfer function per calendar month.
    #[default]
    Month,
    /// One transfer function per meteorological season (DJF, MAM, JJA, SON).
    Season,
}

impl Grouping {
    /// Returns the canonical name of the grouping.
    pub fn name(self) -> &'static str {
        match self {
            Grouping::None => "none",
            Grouping::Month => "month",
            Grouping::Season => "season",
        }
    }

    /// Group key of a time step in `month` (1..=12).
    ///
    /// `None` maps everything to 0, `Month` to the month itself and
    /// `Season` to 0 (DJF), 1 (MAM), 2 (JJA) or 3 (SON).
    pub fn key(self, month: u8) -> u8 {
        match self {
            Grouping::None => 0,
            Grouping::Month => month,
            Grouping::Season => (month % 12) / 3,
        }
    }

    /// Human-readable label of a group key.
    pub fn label(self, key: u8) -> String {
        match self {
            Grouping::None => "all".to_string(),
            Grouping::Month => format!("month {key}"),
            Grouping::Season => ["DJF", "MAM", "JJA", "SON"]
                .get(key as usize)
                .map_or_else(|| format!("season {key}"), |s| (*s).to_string()),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Grouping {
    type Err = QuantileMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.strip_prefix("time.").unwrap_or(key.as_str()) {
            "none" | "time" | "" => Ok(Grouping::None),
            "month" => Ok(Grouping::Month),
            "season" => Ok(Grouping::Season),
            _ => Err(QuantileMapError::UnknownGrouping {
                name: s.to_string(),
            }),
        }
    }
}

/// Whether corrections are added to or multiplied with the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdjustmentKind {
    /// `corrected = value + factor` (temperature-like variables).
    #[default]
    Additive,
    /// `corrected = value * factor` (precipitation-like variables).
    Multiplicative,
}

impl AdjustmentKind {
    /// Returns the symbol of the kind (`+` or `*`).
    pub fn symbol(self) -> &'static str {
        match self {
            AdjustmentKind::Additive => "+",
            AdjustmentKind::Multiplicative => "*",
        }
    }

    /// Correction factor taking `source` onto `target`.
    ///
    /// For the multiplicative kind a zero `source` yields 1.0 when `target`
    /// is also zero and `NaN` otherwise.
    pub fn factor(self, target: f64, source: f64) -> f64 {
        match self {
            AdjustmentKind::Additive => target - source,
            AdjustmentKind::Multiplicative => {
                if source == 0.0 {
                    if target == 0.0 { 1.0 } else { f64::NAN }
                } else {
                    target / source
                }
            }
        }
    }

    /// Applies a correction factor to `value`.
    pub fn apply(self, value: f64, factor: f64) -> f64 {
        match self {
            AdjustmentKind::Additive => value + factor,
            AdjustmentKind::Multiplicative => value * factor,
        }
    }

    /// Removes `base` from `value` (the inverse of [`AdjustmentKind::apply`]).
    pub fn remove(self, value: f64, base: f64) -> f64 {
        match self {
            AdjustmentKind::Additive => value - base,
            AdjustmentKind::Multiplicative => {
                if base == 0.0 { f64::NAN } else { value / base }
            }
        }
    }
}

impl FromStr for AdjustmentKind {
    type Err = QuantileMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "additive" => Ok(AdjustmentKind::Additive),
            "*" | "multiplicative" => Ok(AdjustmentKind::Multiplicative),
            _ => Err(QuantileMapError::UnknownKind {
                name: s.to_string(),
            }),
        }
    }
}

/// Treatment of target values outside the trained range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Use the correction of the nearest boundary node.
    #[default]
    Constant,
    /// Return `NaN`.
    Nan,
}

/// Treatment of target values between trained nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Use the correction of the nearest node.
    #[default]
    Nearest,
    /// Interpolate linearly between the two bracketing nodes.
    Linear,
}

impl FromStr for Extrapolation {
    type Err = QuantileMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" => Ok(Extrapolation::Constant),
            "nan" => Ok(Extrapolation::Nan),
            other => Err(QuantileMapError::InvalidConfig {
                reason: format!("unknown extrapolation '{other}' (expected constant or nan)"),
            }),
        }
    }
}

impl FromStr for Interpolation {
    type Err = QuantileMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "linear" => Ok(Interpolation::Linear),
            other => Err(QuantileMapError::InvalidConfig {
                reason: format!("unknown interpolation '{other}' (expected nearest or linear)"),
            }),
        }
    }
}

/// Configuration for training a quantile-mapping model.
///
/// # Example
///
/// ```
/// use kapy_quantile_map::{Grouping, Method, QmConfig};
///
/// let config = QmConfig::new()
///     .with_method(Method::Dqm)
///     .with_grouping(Grouping::Season)
///     .with_nquantiles(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QmConfig {
    method: Method,
    grouping: Grouping,
    kind: AdjustmentKind,
    nquantiles: usize,
}

impl QmConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `method = Eqm`, `grouping = Month`, `kind = Additive`,
    /// `nquantiles = 20`.
    pub fn new() -> Self {
        Self {
            method: Method::Eqm,
            grouping: Grouping::Month,
            kind: AdjustmentKind::Additive,
            nquantiles: 20,
        }
    }

    /// Settings used for each component of the temperature composite:
    /// additive QDM, monthly groups, 20 quantiles.
    pub fn temperature() -> Self {
        Self::new().with_method(Method::Qdm)
    }

    // --- Builder methods ---

    /// Sets the calibration method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the grouping.
    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Sets the adjustment kind.
    pub fn with_kind(mut self, kind: AdjustmentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the number of quantile nodes per group.
    pub fn with_nquantiles(mut self, n: usize) -> Self {
        self.nquantiles = n;
        self
    }

    // --- Accessors ---

    /// Returns the calibration method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the grouping.
    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    /// Returns the adjustment kind.
    pub fn kind(&self) -> AdjustmentKind {
        self.kind
    }

    /// Returns the number of quantile nodes per group.
    pub fn nquantiles(&self) -> usize {
        self.nquantiles
    }

    /// Minimum number of valid values per group needed for training.
    pub fn min_group_size(&self) -> usize {
        match self.method {
            Method::Scaling => 1,
            _ => self.nquantiles,
        }
    }

    /// Validates this configuration.
    ///
    /// Checks that `nquantiles` is at least 1.
    pub fn validate(&self) -> Result<(), QuantileMapError> {
        if self.nquantiles < 1 {
            return Err(QuantileMapError::InvalidConfig {
                reason: format!("nquantiles must be >= 1, got {}", self.nquantiles),
            });
        }
        Ok(())
    }
}

impl Default for QmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = QmConfig::new();
        assert_eq!(cfg.method(), Method::Eqm);
        assert_eq!(cfg.grouping(), Grouping::Month);
        assert_eq!(cfg.kind(), AdjustmentKind::Additive);
        assert_eq!(cfg.nquantiles(), 20);
        assert_eq!(cfg, QmConfig::default());
    }

    #[test]
    fn temperature_preset() {
        let cfg = QmConfig::temperature();
        assert_eq!(cfg.method(), Method::Qdm);
        assert_eq!(cfg.grouping(), Grouping::Month);
        assert_eq!(cfg.nquantiles(), 20);
    }

    #[test]
    fn method_names() {
        assert_eq!("xclim-eqm".parse::<Method>().unwrap(), Method::Eqm);
        assert_eq!("DQM".parse::<Method>().unwrap(), Method::Dqm);
        assert_eq!("scaling".parse::<Method>().unwrap(), Method::Scaling);
        assert!(matches!(
            "cmethods-linear".parse::<Method>(),
            Err(QuantileMapError::UnsupportedMethod { name }) if name == "cmethods-linear"
        ));
    }

    #[test]
    fn grouping_keys() {
        assert_eq!(Grouping::None.key(7), 0);
        assert_eq!(Grouping::Month.key(7), 7);
        assert_eq!(Grouping::Season.key(12), 0);
        assert_eq!(Grouping::Season.key(2), 0);
        assert_eq!(Grouping::Season.key(3), 1);
        assert_eq!(Grouping::Season.key(8), 2);
        assert_eq!(Grouping::Season.key(11), 3);
        assert_eq!(Grouping::Season.label(2), "JJA");
        assert_eq!("time.month".parse::<Grouping>().unwrap(), Grouping::Month);
        assert!("week".parse::<Grouping>().is_err());
    }

    #[test]
    fn kind_arithmetic() {
        let add = AdjustmentKind::Additive;
        assert_eq!(add.factor(5.0, 3.0), 2.0);
        assert_eq!(add.apply(3.0, 2.0), 5.0);
        assert_eq!(add.remove(5.0, 2.0), 3.0);

        let mul = AdjustmentKind::Multiplicative;
        assert_eq!(mul.factor(6.0, 3.0), 2.0);
        assert_eq!(mul.factor(0.0, 0.0), 1.0);
        assert!(mul.factor(1.0, 0.0).is_nan());
        assert_eq!(mul.apply(3.0, 2.0), 6.0);
        assert_eq!("*".parse::<AdjustmentKind>().unwrap(), mul);
    }

    #[test]
    fn validate_zero_quantiles() {
        assert!(QmConfig::new().with_nquantiles(0).validate().is_err());
    }

    #[test]
    fn scaling_needs_one_value() {
        let cfg = QmConfig::new().with_method(Method::Scaling);
        assert_eq!(cfg.min_group_size(), 1);
        assert_eq!(QmConfig::new().min_group_size(), 20);
    }
}
