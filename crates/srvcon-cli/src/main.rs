//! CLI entry point - the composition root.

use anyhow::Context;
use clap::Parser;

use srvcon_cli::{Cli, Commands, handlers, init_tracing, resolve_settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads SRVCON_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => {
            let settings = resolve_settings(cli.config.as_deref(), &args)?;
            let code = handlers::run::execute(settings, &args)
                .await
                .context("srvcon run failed")?;
            // Exit directly: a pending read on our own stdin would otherwise
            // keep the runtime alive.
            std::process::exit(code);
        }
        Commands::Replay(args) => handlers::replay::execute(&args)?,
    }

    Ok(())
}
