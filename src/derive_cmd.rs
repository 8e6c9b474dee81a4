//! Derive command: build a secondary variable from input series.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use kapy_io::{JsonCheckpoint, SeriesLoader, SeriesWriter};
use kapy_series::{DerivedRegistry, derive_variable};

use crate::cli::DeriveArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the derived-variable pipeline.
pub fn run(args: DeriveArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("derive", id = %args.id).entered();
    // 1. Resolve definition
    let derived = config
        .derived
        .get(&args.id)
        .with_context(|| format!("no [derived.{}] section in config", args.id))?;
    let registry = DerivedRegistry::with_builtins();

    // 2. Load inputs
    let checkpoint = JsonCheckpoint::new();
    let declared = convert::declared_units(&config.inputs)?;
    let mut inputs = BTreeMap::new();
    for (name, path) in parse_inputs(&args.inputs)? {
        let series = checkpoint
            .load(&path)
            .with_context(|| format!("failed to load input '{name}': {}", path.display()))?;
        convert::check_series_units(&declared, &series)?;
        inputs.insert(name, series);
    }
    info!(n_inputs = inputs.len(), processor = %derived.processor, "inputs loaded");

    // 3. Derive
    let series = derive_variable(&registry, &args.id, &derived.processor, &inputs, &derived.args)
        .with_context(|| format!("derived variable '{}' failed", args.id))?;

    // 4. Write
    checkpoint
        .write(&series, &args.output, &convert::build_hints(&config.output))
        .with_context(|| format!("failed to write: {}", args.output.display()))?;
    info!(path = %args.output.display(), "derived variable written");
    Ok(())
}

/// Splits `NAME=PATH` arguments, rejecting duplicates.
fn parse_inputs(raw: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    let mut inputs = BTreeMap::new();
    for arg in raw {
        let Some((name, path)) = arg.split_once('=') else {
            bail!("input {arg:?} is not NAME=PATH");
        };
        if name.is_empty() || path.is_empty() {
            bail!("input {arg:?} is not NAME=PATH");
        }
        if inputs.insert(name.to_string(), PathBuf::from(path)).is_some() {
            bail!("input '{name}' given twice");
        }
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kapy_calendar::{Calendar, CfDate};
    use kapy_io::EncodingHints;
    use kapy_series::{GriddedSeries, Grid, TimeAxis};

    fn field(name: &str, value: f64) -> GriddedSeries {
        let start = CfDate::new(Calendar::NoLeap, 2000, 1, 1).unwrap();
        let time = TimeAxis::daily(Calendar::NoLeap, start, 4);
        GriddedSeries::new(name, "K", time, Grid::with_shape(1, 2), vec![value; 8]).unwrap()
    }

    #[test]
    fn input_pairs_parsed() {
        let parsed = parse_inputs(&["tasmax=/d/a.json".into(), "tasmin=b.json".into()]).unwrap();
        assert_eq!(parsed["tasmax"], PathBuf::from("/d/a.json"));
        assert!(parse_inputs(&["tasmax".into()]).is_err());
        assert!(parse_inputs(&["=x.json".into()]).is_err());
        assert!(parse_inputs(&["a=x".into(), "a=y".into()]).is_err());
    }

    #[test]
    fn builds_diurnal_range_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = JsonCheckpoint::new();
        let hints = EncodingHints::new();
        let tasmax = dir.path().join("tasmax.json");
        let tasmin = dir.path().join("tasmin.json");
        checkpoint.write(&field("tasmax", 300.0), &tasmax, &hints).unwrap();
        checkpoint.write(&field("tasmin", 290.5), &tasmin, &hints).unwrap();

        let config: KapyConfig = toml::from_str(
            r#"
            [derived.dtr]
            processor = "diurnal_range"
            "#,
        )
        .unwrap();
        let output = dir.path().join("dtr.json");
        let args = DeriveArgs {
            id: "dtr".into(),
            inputs: vec![
                format!("tasmax={}", tasmax.display()),
                format!("tasmin={}", tasmin.display()),
            ],
            output: output.clone(),
        };
        run(args, &config).unwrap();

        let dtr = checkpoint.load(&output).unwrap();
        assert_eq!(dtr.name(), "dtr");
        assert_eq!(dtr.units(), "K");
        assert!(dtr.values().iter().all(|&v| v == 9.5));
        assert_eq!(dtr.attributes()["derived_processor"], "diurnal_range");
    }

    #[test]
    fn missing_processor_input_reported() {
        let dir = tempfile::tempdir().unwrap();
        let tasmax = dir.path().join("tasmax.json");
        JsonCheckpoint::new()
            .write(&field("tasmax", 300.0), &tasmax, &EncodingHints::new())
            .unwrap();
        let config: KapyConfig =
            toml::from_str("[derived.dtr]\nprocessor = \"diurnal_range\"\n").unwrap();
        let args = DeriveArgs {
            id: "dtr".into(),
            inputs: vec![format!("tasmax={}", tasmax.display())],
            output: dir.path().join("dtr.json"),
        };
        let err = run(args, &config).unwrap_err();
        assert!(format!("{err:#}").contains("needs input 'tasmin'"));
    }
}
