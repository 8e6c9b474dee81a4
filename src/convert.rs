//! Pure conversion functions: TOML config structs -> crate API config types.
//!
//! Everything here runs before any data is read, so configuration mistakes
//! surface immediately instead of after a long computation.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail};

use crate::config::*;

use kapy_areal::AreaWeights;
use kapy_ensemble::EnsembleConfig;
use kapy_indicators::{IndicatorContext, IndicatorDefinition, Period, Season, Statistic};
use kapy_io::EncodingHints;
use kapy_quantile_map::{CalibrationSettings, QmConfig};
use kapy_series::{DerivedRegistry, GriddedSeries, Grid};

/// Converts the `[[periods]]` table.
pub fn build_periods(periods: &[PeriodToml]) -> Result<Vec<Period>> {
    periods
        .iter()
        .map(|p| {
            let name = p.name.as_deref().unwrap_or(&p.id);
            Period::new(&p.id, name, p.start, p.end).map_err(Into::into)
        })
        .collect()
}

/// Converts the `[[seasons]]` table.
pub fn build_seasons(seasons: &[SeasonToml]) -> Result<Vec<Season>> {
    let mut seen = BTreeSet::new();
    for s in seasons {
        if !seen.insert(s.id.as_str()) {
            bail!("season '{}' is defined twice", s.id);
        }
    }
    seasons
        .iter()
        .map(|s| Season::new(&s.id, s.months.clone()).map_err(Into::into))
        .collect()
}

/// Builds the indicator context from the period and season tables.
pub fn build_context(config: &KapyConfig) -> Result<IndicatorContext> {
    let mut context = IndicatorContext::new(build_periods(&config.periods)?);
    for season in build_seasons(&config.seasons)? {
        context = context.with_season(season);
    }
    Ok(context)
}

/// Renders a TOML threshold so that numbers and numeric strings are both
/// accepted and anything else fails as an invalid threshold.
fn threshold_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Builds one indicator definition.
pub fn build_definition(id: &str, ind: &IndicatorToml) -> Result<IndicatorDefinition> {
    let mut args = BTreeMap::new();
    if let Some(ref op) = ind.op {
        args.insert("op".to_string(), op.clone());
    }
    if let Some(ref threshold) = ind.threshold {
        args.insert("threshold".to_string(), threshold_text(threshold));
    }
    if let Some(ref name) = ind.custom {
        args.insert("name".to_string(), name.clone());
    }
    let context = || format!("indicator '{id}'");
    let statistic = Statistic::from_parts(&ind.statistic, &args).with_context(context)?;

    let mut definition = IndicatorDefinition::new(id, statistic)
        .with_seasons(ind.seasons.iter().cloned())
        .with_time_binning(ind.time_binning.parse().with_context(context)?)
        .with_delta_type(ind.delta_type.parse().with_context(context)?);
    if let Some(ref name) = ind.name {
        definition = definition.with_name(name);
    }
    if let Some(ref units) = ind.units {
        definition = definition.with_units(units);
    }
    definition.validate().with_context(context)?;
    Ok(definition)
}

/// Builds the bias-correction settings of one calibration id.
pub fn build_calibration(id: &str, cal: &CalibrationToml) -> Result<CalibrationSettings> {
    let context = || format!("calibration '{id}'");
    let config = QmConfig::new()
        .with_method(cal.method.parse().with_context(context)?)
        .with_grouping(cal.grouping.parse().with_context(context)?)
        .with_kind(cal.kind.parse().with_context(context)?)
        .with_nquantiles(cal.nquantiles);
    let mut settings = CalibrationSettings::new(id, cal.cal_start, cal.cal_end)
        .with_config(config)
        .with_extrapolation(cal.extrapolation.parse().with_context(context)?)
        .with_interpolation(cal.interpolation.parse().with_context(context)?);
    if let Some(ref name) = cal.out_variable {
        settings = settings.with_out_variable(name);
    }
    settings.validate().with_context(context)?;
    Ok(settings)
}

/// Builds the ensemble configuration.
pub fn build_ensemble_config(ensemble: &EnsembleToml) -> Result<EnsembleConfig> {
    let config = EnsembleConfig::new().with_percentiles(ensemble.percentiles.clone());
    config.validate()?;
    Ok(config)
}

/// Builds the checkpoint encoding hints.
pub fn build_hints(output: &OutputToml) -> EncodingHints {
    let hints = EncodingHints::new().with_pretty(output.pretty);
    match output.decimals {
        Some(d) => hints.with_decimals(d),
        None => hints,
    }
}

/// Fails unless every `[derived.<id>]` names a known processor.
pub fn check_derived(derived: &BTreeMap<String, DerivedToml>, registry: &DerivedRegistry) -> Result<()> {
    for (id, d) in derived {
        if registry.get(&d.processor).is_none() {
            let known: Vec<&str> = registry.names().collect();
            bail!(
                "derived variable '{id}': unknown processor '{}' (known: {})",
                d.processor,
                known.join(", ")
            );
        }
    }
    Ok(())
}

/// Collects the declared units per variable id.
///
/// Fails if the same variable is declared with different units.
pub fn declared_units(inputs: &[InputToml]) -> Result<BTreeMap<String, String>> {
    let mut units: BTreeMap<String, String> = BTreeMap::new();
    for input in inputs {
        match units.get(&input.variable) {
            Some(existing) if *existing != input.units => bail!(
                "variable '{}' declared with units '{}' and '{}'",
                input.variable,
                existing,
                input.units
            ),
            Some(_) => {}
            None => {
                units.insert(input.variable.clone(), input.units.clone());
            }
        }
    }
    Ok(units)
}

/// Fails if a loaded series disagrees with the units declared for its
/// variable.
pub fn check_series_units(declared: &BTreeMap<String, String>, series: &GriddedSeries) -> Result<()> {
    if let Some(units) = declared.get(series.name())
        && units != series.units()
    {
        bail!(
            "series '{}' has units '{}' but [[inputs]] declares '{}'",
            series.name(),
            series.units(),
            units
        );
    }
    Ok(())
}

/// Parses `[areal].weighting`; `true` selects cosine-latitude weights.
fn cos_lat_weighting(weighting: &str) -> Result<bool> {
    match weighting.to_lowercase().as_str() {
        "cos_lat" | "coslat" => Ok(true),
        "uniform" => Ok(false),
        other => bail!("unknown areal weighting: {other:?}"),
    }
}

/// Builds the areas of the `[areal]` section for `grid`.
pub fn build_areas(areal: &ArealToml, grid: &Grid) -> Result<Vec<AreaWeights>> {
    let base = if cos_lat_weighting(&areal.weighting)? {
        AreaWeights::cos_latitude(grid)
    } else {
        AreaWeights::uniform(grid)
    };
    let mut areas = Vec::with_capacity(areal.areas.len() + 1);
    if areal.whole_domain {
        areas.push(base.clone());
    }
    for area in &areal.areas {
        areas.push(base.clone().with_mask(&area.id, &area.mask)?);
    }
    if areas.is_empty() {
        bail!("no areas: enable [areal].whole_domain or add [[areal.areas]]");
    }
    Ok(areas)
}

/// Runs every configuration check that does not need data.
///
/// 1. periods and seasons are well-formed
/// 2. declared units agree per variable
/// 3. every calibration converts
/// 4. every indicator converts and only requests known seasons
/// 5. ensemble percentiles are valid
/// 6. the areal weighting is known
/// 7. derived variables name known processors
pub fn validate(config: &KapyConfig) -> Result<()> {
    let context = build_context(config)?;
    declared_units(&config.inputs)?;
    check_derived(&config.derived, &DerivedRegistry::with_builtins())?;
    for (id, cal) in &config.calibration {
        build_calibration(id, cal)?;
    }
    for (id, ind) in &config.indicators {
        let definition = build_definition(id, ind)?;
        context.check(&definition)?;
    }
    build_ensemble_config(&config.ensemble)?;
    cos_lat_weighting(&config.areal.weighting)?;
    Ok(())
}
