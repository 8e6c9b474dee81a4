//! Temperature command: correct tas, tasmax and tasmin together.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use kapy_io::{JsonCheckpoint, SeriesLoader, SeriesWriter};
use kapy_quantile_map::{QmConfig, TemperatureSeries, correct_temperature};

use crate::cli::TemperatureArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the temperature composite correction.
pub fn run(args: TemperatureArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("temperature", model = %args.model).entered();
    let checkpoint = JsonCheckpoint::new();
    let declared = convert::declared_units(&config.inputs)?;

    // 1. Load the three triples
    let reference = load_triple(&checkpoint, &args.reference, &declared)?;
    let hist = load_triple(&checkpoint, &args.hist, &declared)?;
    let target = match args.target {
        Some(ref paths) => load_triple(&checkpoint, paths, &declared)?,
        None => hist.clone(),
    };

    // 2. Correct
    let corrected = correct_temperature(
        &args.model,
        &reference,
        &hist,
        &target,
        &QmConfig::temperature(),
    )
    .with_context(|| format!("temperature correction failed for model '{}'", args.model))?;

    // 3. Write
    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output dir: {}", args.output_dir.display())
    })?;
    let hints = convert::build_hints(&config.output);
    for series in [corrected.tas(), corrected.tasmax(), corrected.tasmin()] {
        let path = args.output_dir.join(format!("{}.json", series.name()));
        checkpoint
            .write(series, &path, &hints)
            .with_context(|| format!("failed to write: {}", path.display()))?;
        info!(path = %path.display(), "corrected series written");
    }
    Ok(())
}

fn load_triple(
    checkpoint: &JsonCheckpoint,
    paths: &[PathBuf],
    declared: &BTreeMap<String, String>,
) -> Result<TemperatureSeries> {
    let [tas, tasmax, tasmin] = paths else {
        bail!("expected tas, tasmax and tasmin paths, got {}", paths.len());
    };
    let load = |path: &Path| {
        let series = checkpoint
            .load(path)
            .with_context(|| format!("failed to load: {}", path.display()))?;
        convert::check_series_units(declared, &series)?;
        Ok::<_, anyhow::Error>(series)
    };
    Ok(TemperatureSeries::new(
        load(tas.as_path())?,
        load(tasmax.as_path())?,
        load(tasmin.as_path())?,
    )?)
}
