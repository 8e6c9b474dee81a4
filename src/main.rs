mod areal_cmd;
mod calibrate_cmd;
mod cli;
mod config;
mod convert;
mod derive_cmd;
mod ensemble_cmd;
mod indicator_cmd;
mod logging;
mod temperature_cmd;

use std::path::Path;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::KapyConfig;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli.config, cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(config_path: &Path, command: Command) -> Result<()> {
    let config = KapyConfig::load(config_path)?;
    convert::validate(&config)?;
    info!(path = %config_path.display(), "configuration checked");

    match command {
        Command::Check => Ok(()),
        Command::Calibrate(args) => calibrate_cmd::run(args, &config),
        Command::Temperature(args) => temperature_cmd::run(args, &config),
        Command::Derive(args) => derive_cmd::run(args, &config),
        Command::Indicator(args) => indicator_cmd::run(args, &config),
        Command::Ensemble(args) => ensemble_cmd::run(args, &config),
        Command::Areal(args) => areal_cmd::run(args, &config),
    }
}
