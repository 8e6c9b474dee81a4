//! Indicator definitions and the shared context they are built in.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::IndicatorError;
use crate::period::{ALL_SEASON, Period, Season};
use crate::statistic::{Statistic, StatisticRegistry};

/// How the time axis is binned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBinning {
    /// One bin per configured period.
    #[default]
    Periods,
    /// One bin per calendar year, stamped on 1 January.
    Years,
    /// One bin per calendar month, stamped on the 15th.
    Months,
}

impl TimeBinning {
    pub fn name(self) -> &'static str {
        match self {
            TimeBinning::Periods => "periods",
            TimeBinning::Years => "years",
            TimeBinning::Months => "months",
        }
    }
}

impl fmt::Display for TimeBinning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeBinning {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "periods" => Ok(TimeBinning::Periods),
            "years" => Ok(TimeBinning::Years),
            "months" => Ok(TimeBinning::Months),
            _ => Err(IndicatorError::UnknownTimeBinning {
                name: s.to_string(),
            }),
        }
    }
}

/// How deltas relate each bin to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaType {
    /// `value - reference`.
    #[default]
    Subtract,
    /// `value / reference`.
    Divide,
}

impl DeltaType {
    pub fn name(self) -> &'static str {
        match self {
            DeltaType::Subtract => "subtract",
            DeltaType::Divide => "divide",
        }
    }

    /// Applies the delta to one value.
    pub fn apply(self, value: f64, reference: f64) -> f64 {
        match self {
            DeltaType::Subtract => value - reference,
            DeltaType::Divide => value / reference,
        }
    }
}

impl fmt::Display for DeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeltaType {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subtract" => Ok(DeltaType::Subtract),
            "divide" => Ok(DeltaType::Divide),
            _ => Err(IndicatorError::UnknownDeltaType {
                name: s.to_string(),
            }),
        }
    }
}

/// Definition of one indicator.
///
/// # Example
///
/// ```
/// use kapy_indicators::{IndicatorDefinition, Statistic, TimeBinning};
///
/// let def = IndicatorDefinition::new("101", Statistic::Mean)
///     .with_name("Mean temperature")
///     .with_units("K")
///     .with_seasons(["all", "JJA"])
///     .with_time_binning(TimeBinning::Years);
/// assert!(def.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDefinition {
    id: String,
    name: String,
    units: Option<String>,
    statistic: Statistic,
    seasons: Vec<String>,
    time_binning: TimeBinning,
    delta_type: DeltaType,
}

impl IndicatorDefinition {
    /// Creates a definition with defaults.
    ///
    /// Defaults: `name = id`, `units = None` (keep the input units),
    /// `seasons = ["all"]`, `time_binning = Periods`,
    /// `delta_type = Subtract`.
    pub fn new(id: impl Into<String>, statistic: Statistic) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            units: None,
            statistic,
            seasons: vec![ALL_SEASON.to_string()],
            time_binning: TimeBinning::Periods,
            delta_type: DeltaType::Subtract,
        }
    }

    // --- Builder methods ---

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the output units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the season identifiers to evaluate.
    pub fn with_seasons<I, S>(mut self, seasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seasons = seasons.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the time-binning mode.
    pub fn with_time_binning(mut self, time_binning: TimeBinning) -> Self {
        self.time_binning = time_binning;
        self
    }

    /// Sets the delta type.
    pub fn with_delta_type(mut self, delta_type: DeltaType) -> Self {
        self.delta_type = delta_type;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output units, `None` to keep the input series' units.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn statistic(&self) -> &Statistic {
        &self.statistic
    }

    pub fn seasons(&self) -> &[String] {
        &self.seasons
    }

    pub fn time_binning(&self) -> TimeBinning {
        self.time_binning
    }

    pub fn delta_type(&self) -> DeltaType {
        self.delta_type
    }

    /// Validates this definition on its own.
    ///
    /// Checks that at least one season is requested and none twice.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.seasons.is_empty() {
            return Err(IndicatorError::InvalidConfig {
                reason: format!("indicator '{}' requests no seasons", self.id),
            });
        }
        for (i, s) in self.seasons.iter().enumerate() {
            if self.seasons[..i].contains(s) {
                return Err(IndicatorError::InvalidConfig {
                    reason: format!("indicator '{}' requests season '{s}' twice", self.id),
                });
            }
        }
        Ok(())
    }

    /// Provenance attributes recorded on the result.
    pub(crate) fn attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), self.id.clone());
        attrs.insert("name".to_string(), self.name.clone());
        if let Some(units) = &self.units {
            attrs.insert("units".to_string(), units.clone());
        }
        attrs.insert("statistic".to_string(), self.statistic.to_string());
        attrs.insert("seasons".to_string(), self.seasons.join(","));
        attrs.insert("time_binning".to_string(), self.time_binning.to_string());
        attrs.insert("delta_type".to_string(), self.delta_type.to_string());
        attrs
    }
}

/// Periods, seasons and custom statistics shared by all indicators of a run.
#[derive(Debug, Clone, Default)]
pub struct IndicatorContext {
    periods: Vec<Period>,
    seasons: BTreeMap<String, Season>,
    registry: StatisticRegistry,
}

impl IndicatorContext {
    /// Creates a context with the given periods in configured order.
    ///
    /// The first period is the delta reference.
    pub fn new(periods: Vec<Period>) -> Self {
        Self {
            periods,
            seasons: BTreeMap::new(),
            registry: StatisticRegistry::new(),
        }
    }

    // --- Builder methods ---

    /// Adds (or replaces) a season.
    pub fn with_season(mut self, season: Season) -> Self {
        self.seasons.insert(season.id().to_string(), season);
        self
    }

    /// Sets the custom statistic registry.
    pub fn with_registry(mut self, registry: StatisticRegistry) -> Self {
        self.registry = registry;
        self
    }

    // --- Accessors ---

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn seasons(&self) -> &BTreeMap<String, Season> {
        &self.seasons
    }

    pub fn registry(&self) -> &StatisticRegistry {
        &self.registry
    }

    /// Resolves a season id; `"all"` expands to every month unless the table
    /// defines it.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::UnknownSeason`] naming the indicator.
    pub fn season(&self, indicator_id: &str, season_id: &str) -> Result<Season, IndicatorError> {
        match self.seasons.get(season_id) {
            Some(season) => Ok(season.clone()),
            None if season_id == ALL_SEASON => Ok(Season::all()),
            None => Err(IndicatorError::UnknownSeason {
                indicator_id: indicator_id.to_string(),
                season_id: season_id.to_string(),
            }),
        }
    }

    /// Checks `definition` against this context before any data is touched.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidConfig`] without periods,
    /// [`IndicatorError::UnknownSeason`] for an undefined season and
    /// [`IndicatorError::UnknownStatistic`] for an unregistered custom
    /// statistic.
    pub fn check(&self, definition: &IndicatorDefinition) -> Result<Vec<Season>, IndicatorError> {
        definition.validate()?;
        if self.periods.is_empty() {
            return Err(IndicatorError::InvalidConfig {
                reason: "at least one period is required".to_string(),
            });
        }
        if let Statistic::Custom { name } = definition.statistic()
            && self.registry.get(name).is_none()
        {
            return Err(IndicatorError::UnknownStatistic { name: name.clone() });
        }
        definition
            .seasons()
            .iter()
            .map(|s| self.season(definition.id(), s))
            .collect()
    }
}
