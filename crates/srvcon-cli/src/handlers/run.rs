//! `srvcon run`: wrap a server process with the console.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use srvcon_core::{ConsoleSettings, LineType};
use srvcon_runtime::{ConsoleLogger, spawn_output_reader};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::commands::RunArgs;

/// Run the command to completion and return its exit code.
pub async fn execute(settings: ConsoleSettings, args: &RunArgs) -> anyhow::Result<i32> {
    let (program, program_args) = args
        .command
        .split_first()
        .context("No command given to run")?;

    let flush_interval = settings.effective_flush_interval();
    let holdoff = settings.effective_holdoff();
    let logger = Arc::new(ConsoleLogger::new(settings).context("Failed to start console")?);
    logger.log_info(&format!("srvcon {} starting", env!("CARGO_PKG_VERSION")));

    let display = args.command.join(" ");
    let mut child = Command::new(program)
        .args(program_args)
        .stdin(if args.no_stdin {
            Stdio::null()
        } else {
            Stdio::piped()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start '{display}'"))?;

    let pid = child
        .id()
        .map_or_else(|| "?".to_string(), |id| id.to_string());
    logger.log_system(&format!("Started {display} (pid {pid})"));

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_output_reader(stdout, LineType::StdOut, Arc::clone(&logger)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_output_reader(stderr, LineType::StdErr, Arc::clone(&logger)));
    }

    let admin = admin_name(args.admin.as_deref());
    let forwarder = child
        .stdin
        .take()
        .map(|stdin| spawn_stdin_forwarder(stdin, admin, Arc::clone(&logger)));

    let status = wait_or_interrupt(&mut child, &logger).await?;

    if let Some(forwarder) = forwarder {
        forwarder.abort();
        let _ = forwarder.await;
    }
    for reader in readers {
        if let Err(e) = reader.await {
            warn!(error = %e, "Output reader task failed");
        }
    }

    logger.log_system(&format!("Process exited with {status}"));
    settle(&logger, flush_interval, holdoff).await;
    logger.shutdown().await;

    if args.stats {
        let stats = serde_json::to_string_pretty(&logger.stats())?;
        eprintln!("{stats}");
    }

    Ok(status.code().unwrap_or(1))
}

async fn wait_or_interrupt(child: &mut Child, logger: &ConsoleLogger) -> anyhow::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => return status.context("Failed to wait for child process"),
        _ = tokio::signal::ctrl_c() => {}
    }

    logger.log_system("Interrupted, stopping server");
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill child process");
    }
    child.wait().await.context("Failed to wait for child process")
}

/// Forward operator input lines to the child, echoing each as an admin command.
fn spawn_stdin_forwarder(
    mut child_stdin: ChildStdin,
    admin: String,
    logger: Arc<ConsoleLogger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    logger.log_admin_command(&admin, &line);
                    let sent = async {
                        child_stdin.write_all(line.as_bytes()).await?;
                        child_stdin.write_all(b"\n").await?;
                        child_stdin.flush().await
                    };
                    if let Err(e) = sent.await {
                        debug!(error = %e, "Child stdin closed");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Operator stdin reader exiting due to read error");
                    break;
                }
            }
        }
    })
}

/// Give the flush task time to emit the final lines.
///
/// Waits at least two flush intervals, and up to one holdoff longer while
/// fragments are still held back.
async fn settle(logger: &ConsoleLogger, flush_interval: Duration, holdoff: Duration) {
    tokio::time::sleep(flush_interval * 2).await;
    let deadline = tokio::time::Instant::now() + holdoff + flush_interval;
    while logger.stats().deferred > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(flush_interval).await;
    }
}

fn admin_name(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "admin".to_string())
}
