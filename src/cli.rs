use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SEATS model-based seasonal adjustment.
#[derive(Parser)]
#[command(
    name = "seats",
    version,
    about = "Canonical decomposition of seasonal ARIMA models"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Decompose every series of a job file.
    Decompose(DecomposeArgs),
    /// Check that the models of a job file validate and decompose.
    Validate(ValidateArgs),
}

/// Arguments for the `decompose` subcommand.
#[derive(clap::Args)]
pub struct DecomposeArgs {
    /// Path to the TOML job file.
    #[arg(short, long, default_value = "seats.toml")]
    pub config: PathBuf,

    /// Path for the JSON results.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the components estimator of the job file (burman or kalman).
    #[arg(short, long)]
    pub estimator: Option<String>,
}

/// Arguments for the `validate` subcommand.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the TOML job file.
    #[arg(short, long, default_value = "seats.toml")]
    pub config: PathBuf,
}
