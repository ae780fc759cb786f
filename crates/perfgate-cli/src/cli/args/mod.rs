use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod run;
pub use run::*;

#[derive(Parser)]
#[command(
    name = "perfgate",
    version,
    about = "Threshold-based performance validation for document databases"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the probe battery against a recorded snapshot
    Run(RunArgs),
    /// List the probe battery with effective thresholds
    Probes(ProbesArgs),
    /// Load and validate a configuration file
    Validate(ValidateArgs),
    /// Write a sample perfgate.yaml
    Init(InitArgs),
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct ProbesArgs {
    #[arg(long, env = "PERFGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[arg(long, default_value = "perfgate.yaml")]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = "perfgate.yaml")]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
