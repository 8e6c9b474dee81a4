//! Calibrate command: bias-correct one simulated series.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use kapy_io::{JsonCheckpoint, SeriesLoader, SeriesWriter};
use kapy_quantile_map::calibrate;

use crate::cli::CalibrateArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the calibration pipeline.
pub fn run(args: CalibrateArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("calibrate", id = %args.id).entered();
    // 1. Resolve settings
    let cal = config
        .calibration
        .get(&args.id)
        .with_context(|| format!("no [calibration.{}] section in config", args.id))?;
    let settings = convert::build_calibration(&args.id, cal)?;
    let declared = convert::declared_units(&config.inputs)?;

    // 2. Load series
    let checkpoint = JsonCheckpoint::new();
    let reference = checkpoint
        .load(&args.reference)
        .with_context(|| format!("failed to load reference: {}", args.reference.display()))?;
    let hist = checkpoint
        .load(&args.hist)
        .with_context(|| format!("failed to load simulation: {}", args.hist.display()))?;
    convert::check_series_units(&declared, &reference)?;
    convert::check_series_units(&declared, &hist)?;
    info!(
        reference = reference.name(),
        n_ref = reference.n_time(),
        n_hist = hist.n_time(),
        "series loaded"
    );

    // 3. Train and adjust
    let corrected = calibrate(&reference, &hist, &settings)
        .with_context(|| format!("calibration '{}' failed", args.id))?;

    // 4. Write
    checkpoint
        .write(&corrected, &args.output, &convert::build_hints(&config.output))
        .with_context(|| format!("failed to write: {}", args.output.display()))?;
    info!(path = %args.output.display(), name = corrected.name(), "corrected series written");
    Ok(())
}
