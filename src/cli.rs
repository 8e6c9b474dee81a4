use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kapy climate-model post-processing.
#[derive(Parser)]
#[command(
    name = "kapy",
    version,
    about = "Bias correction, climate indicators and ensemble statistics"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true, default_value = "kapy.toml")]
    pub config: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Check the configuration without reading any data.
    Check,
    /// Bias-correct a simulated series against a reference.
    Calibrate(CalibrateArgs),
    /// Bias-correct a tas/tasmax/tasmin triple consistently.
    Temperature(TemperatureArgs),
    /// Build a derived variable from input series.
    Derive(DeriveArgs),
    /// Compute one indicator from a series.
    Indicator(IndicatorArgs),
    /// Combine indicator results of several models.
    Ensemble(EnsembleArgs),
    /// Spatial mean and standard deviation of an indicator result.
    Areal(ArealArgs),
}

/// Arguments for the `calibrate` subcommand.
#[derive(clap::Args)]
pub struct CalibrateArgs {
    /// Calibration id in `[calibration.<id>]`.
    #[arg(long)]
    pub id: String,

    /// Reference (observed) series checkpoint.
    #[arg(long)]
    pub reference: PathBuf,

    /// Simulated series checkpoint to correct.
    #[arg(long)]
    pub hist: PathBuf,

    /// Output checkpoint path.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `temperature` subcommand.
#[derive(clap::Args)]
pub struct TemperatureArgs {
    /// Model identifier used in error reports.
    #[arg(long)]
    pub model: String,

    /// Reference tas, tasmax and tasmin checkpoints.
    #[arg(long, num_args = 3, value_names = ["TAS", "TASMAX", "TASMIN"])]
    pub reference: Vec<PathBuf>,

    /// Historical simulation tas, tasmax and tasmin checkpoints.
    #[arg(long, num_args = 3, value_names = ["TAS", "TASMAX", "TASMIN"])]
    pub hist: Vec<PathBuf>,

    /// Series to correct; defaults to the historical simulation.
    #[arg(long, num_args = 3, value_names = ["TAS", "TASMAX", "TASMIN"])]
    pub target: Option<Vec<PathBuf>>,

    /// Directory receiving tas.json, tasmax.json and tasmin.json.
    #[arg(short, long)]
    pub output_dir: PathBuf,
}

/// Arguments for the `derive` subcommand.
#[derive(clap::Args)]
pub struct DeriveArgs {
    /// Derived variable id in `[derived.<id>]`.
    #[arg(long)]
    pub id: String,

    /// Input checkpoints as `NAME=PATH`, e.g. `tasmax=tasmax.json`.
    #[arg(short, long = "input", num_args = 1.., required = true)]
    pub inputs: Vec<String>,

    /// Output checkpoint path.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `indicator` subcommand.
#[derive(clap::Args)]
pub struct IndicatorArgs {
    /// Indicator id in `[indicators.<id>]`.
    #[arg(long)]
    pub id: String,

    /// Input series checkpoint.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output checkpoint path.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `ensemble` subcommand.
#[derive(clap::Args)]
pub struct EnsembleArgs {
    /// Indicator checkpoints, one per member.
    #[arg(short, long, num_args = 1.., required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output checkpoint path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write areal statistics of the ensemble to this path.
    #[arg(long)]
    pub areal_output: Option<PathBuf>,
}

/// Arguments for the `areal` subcommand.
#[derive(clap::Args)]
pub struct ArealArgs {
    /// Indicator checkpoint.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output table path.
    #[arg(short, long)]
    pub output: PathBuf,
}
