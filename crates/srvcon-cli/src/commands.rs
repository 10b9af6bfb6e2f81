//! Subcommand definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use srvcon_core::LogRotation;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a server process and stream its console
    Run(RunArgs),
    /// Render a captured web transcript with readable timestamps
    Replay(ReplayArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Do not echo the console to this terminal
    #[arg(short, long, env = "SRVCON_QUIET")]
    pub quiet: bool,

    /// Directory for rotating console log files
    #[arg(long, env = "SRVCON_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log file name prefix
    #[arg(long, env = "SRVCON_LOG_PREFIX")]
    pub log_prefix: Option<String>,

    /// Log rotation: daily, hourly or never
    #[arg(long, env = "SRVCON_ROTATION", value_parser = parse_rotation)]
    pub rotation: Option<LogRotation>,

    /// Flush cadence in milliseconds
    #[arg(long, env = "SRVCON_FLUSH_INTERVAL_MS")]
    pub flush_interval_ms: Option<u64>,

    /// How long an open line may hold back other output, in milliseconds
    #[arg(long, env = "SRVCON_HOLDOFF_MS")]
    pub holdoff_ms: Option<u64>,

    /// Name shown on commands typed into this console
    #[arg(long, env = "SRVCON_ADMIN")]
    pub admin: Option<String>,

    /// Do not forward this terminal's input to the server
    #[arg(long)]
    pub no_stdin: bool,

    /// Print console usage stats as JSON to stderr on exit
    #[arg(long)]
    pub stats: bool,

    /// Command to run, after `--`
    #[arg(required = true, last = true, num_args = 1..)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Web transcript to render
    pub file: PathBuf,

    /// Show timestamps in UTC instead of local time
    #[arg(long)]
    pub utc: bool,
}

fn parse_rotation(value: &str) -> Result<LogRotation, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "daily" => Ok(LogRotation::Daily),
        "hourly" => Ok(LogRotation::Hourly),
        "never" => Ok(LogRotation::Never),
        other => Err(format!(
            "unknown rotation '{other}' (expected daily, hourly or never)"
        )),
    }
}
