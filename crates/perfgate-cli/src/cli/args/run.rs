//! `perfgate run` arguments.

use std::path::PathBuf;

use clap::Parser;

use super::OutputFormat;

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// Recorded data store snapshot (YAML, or JSON by extension)
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Threshold overrides and settings; built-in defaults when omitted
    #[arg(long, env = "PERFGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long)]
    pub json_out: Option<PathBuf>,

    #[arg(long)]
    pub junit_out: Option<PathBuf>,

    /// Per-probe timeout, overrides settings.timeout_ms
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Probes run at once, overrides settings.concurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Previous JSON report to compare against
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Exit 1 when any probe regressed against the baseline
    #[arg(long, requires = "baseline")]
    pub strict_baseline: bool,

    /// Suppress per-probe progress lines on stderr
    #[arg(long)]
    pub no_progress: bool,
}
