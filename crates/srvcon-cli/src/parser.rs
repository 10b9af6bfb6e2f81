//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Run a server process behind an assembled, timestamped console.
#[derive(Debug, Parser)]
#[command(name = "srvcon")]
#[command(about = "Wrap a server process with an interleaving-safe console")]
#[command(version)]
pub struct Cli {
    /// JSON settings file; flags and environment override its values
    #[arg(long, global = true, env = "SRVCON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug diagnostics on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "srvcon",
            "--verbose",
            "--config",
            "/etc/srvcon.json",
            "replay",
            "console.txt",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/srvcon.json")));
        assert!(matches!(cli.command, Commands::Replay(_)));
    }
}
