//! Terminal sink.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use srvcon_core::{ConsoleFlush, ConsoleSink, SinkError};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

/// Writes the terminal encoding to a byte stream, normally stdout.
///
/// Writes go through a background worker, so a stalled reader on the other
/// end never holds up the flush cycle.
pub struct TerminalSink {
    writer: NonBlocking,
    _guard: WorkerGuard,
    quiet: AtomicBool,
}

impl TerminalSink {
    pub fn new<W: Write + Send + 'static>(writer: W, quiet: bool) -> Self {
        let (writer, guard) = tracing_appender::non_blocking(writer);
        Self {
            writer,
            _guard: guard,
            quiet: AtomicBool::new(quiet),
        }
    }

    pub fn stdout(quiet: bool) -> Self {
        Self::new(io::stdout(), quiet)
    }

    /// Suppress or resume terminal output.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for TerminalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSink")
            .field("quiet", &self.is_quiet())
            .finish_non_exhaustive()
    }
}

impl ConsoleSink for TerminalSink {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn write_flush(&self, flush: &ConsoleFlush) -> Result<(), SinkError> {
        if self.is_quiet() || flush.terminal.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.clone();
        writer.write_all(flush.terminal.as_bytes())?;
        Ok(())
    }
}
