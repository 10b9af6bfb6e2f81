//! Composition root helpers: diagnostics and settings resolution.

use std::path::Path;

use anyhow::Context;
use srvcon_core::{ConsoleSettings, ConsoleSettingsUpdate, validate_settings};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::RunArgs;

/// Install the diagnostics subscriber.
///
/// Diagnostics go to stderr so they never mix with the console transcript
/// on stdout. Priority: `RUST_LOG` > `--verbose` > `warn`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .ok(); // Ignore error if already initialized
}

/// Build console settings from defaults, an optional JSON file and flags.
///
/// Later sources win: defaults, then the file, then flags and environment.
pub fn resolve_settings(config: Option<&Path>, args: &RunArgs) -> anyhow::Result<ConsoleSettings> {
    let mut settings = ConsoleSettings::with_defaults();

    if let Some(path) = config {
        let file = ConsoleSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        settings.merge(&update_from_file(file));
    }

    settings.merge(&update_from_args(args));
    validate_settings(&settings).context("Invalid console settings")?;

    debug!(?settings, "Resolved console settings");
    Ok(settings)
}

/// Fields present in a settings file, as an update.
fn update_from_file(file: ConsoleSettings) -> ConsoleSettingsUpdate {
    ConsoleSettingsUpdate {
        flush_interval_ms: file.flush_interval_ms.map(Some),
        holdoff_ms: file.holdoff_ms.map(Some),
        recent_buffer_bytes: file.recent_buffer_bytes.map(Some),
        recent_trim_bytes: file.recent_trim_bytes.map(Some),
        quiet: file.quiet.map(Some),
        log_dir: file.log_dir.map(Some),
        log_file_prefix: file.log_file_prefix.map(Some),
        max_log_files: file.max_log_files.map(Some),
        rotation: file.rotation.map(Some),
    }
}

fn update_from_args(args: &RunArgs) -> ConsoleSettingsUpdate {
    ConsoleSettingsUpdate {
        flush_interval_ms: args.flush_interval_ms.map(Some),
        holdoff_ms: args.holdoff_ms.map(Some),
        // A bare flag can only switch quiet on.
        quiet: args.quiet.then_some(Some(true)),
        log_dir: args.log_dir.clone().map(Some),
        log_file_prefix: args.log_prefix.clone().map(Some),
        rotation: args.rotation.map(Some),
        ..ConsoleSettingsUpdate::default()
    }
}
