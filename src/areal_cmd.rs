//! Areal command: spatial statistics of one indicator result.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use kapy_areal::areal_statistics;
use kapy_io::JsonCheckpoint;

use crate::cli::ArealArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the areal statistics.
pub fn run(args: ArealArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("areal").entered();
    let checkpoint = JsonCheckpoint::new();
    let result = checkpoint
        .load_indicator(&args.input)
        .with_context(|| format!("failed to load: {}", args.input.display()))?;

    let areas = convert::build_areas(&config.areal, result.axes().grid())?;
    let rows = areal_statistics(&result, &areas)?;
    checkpoint
        .write_areal(&rows, &args.output, &convert::build_hints(&config.output))
        .with_context(|| format!("failed to write: {}", args.output.display()))?;
    info!(path = %args.output.display(), n_rows = rows.len(), "areal table written");
    Ok(())
}
