//! Ensemble command: combine member indicator results.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use kapy_areal::areal_statistics;
use kapy_ensemble::combine_ensemble;
use kapy_io::JsonCheckpoint;

use crate::cli::EnsembleArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the ensemble combination.
pub fn run(args: EnsembleArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("ensemble").entered();
    let ensemble_cfg = convert::build_ensemble_config(&config.ensemble)?;
    let hints = convert::build_hints(&config.output);

    // 1. Load members
    let checkpoint = JsonCheckpoint::new();
    let members = args
        .inputs
        .iter()
        .map(|path| {
            checkpoint
                .load_indicator(path)
                .with_context(|| format!("failed to load member: {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    info!(n_members = members.len(), "members loaded");

    // 2. Combine
    let stats = combine_ensemble(&members, &ensemble_cfg).context("ensemble combination failed")?;
    checkpoint
        .write_ensemble(&stats, &args.output, &hints)
        .with_context(|| format!("failed to write: {}", args.output.display()))?;
    info!(path = %args.output.display(), "ensemble written");

    // 3. Optional areal statistics of the ensemble fields
    if let Some(ref path) = args.areal_output {
        let areas = convert::build_areas(&config.areal, stats.axes().grid())?;
        let rows = areal_statistics(&stats, &areas)?;
        checkpoint
            .write_areal(&rows, path, &hints)
            .with_context(|| format!("failed to write: {}", path.display()))?;
        info!(path = %path.display(), n_rows = rows.len(), "areal table written");
    }
    Ok(())
}
