//! Rolling log file sink.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use srvcon_core::{ConsoleError, ConsoleFlush, ConsoleSink, LogRotation, SinkError};
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// CSI, OSC and two-byte escape sequences.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("ANSI escape pattern is valid")
});

/// Remove terminal escape sequences, leaving the visible text.
pub fn strip_ansi_codes(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    ANSI_ESCAPE.replace_all(text, "")
}

/// Appends the file encoding to a log file through a background writer.
///
/// Writes never block the flush cycle; the worker drains them and flushes
/// whatever is left when the sink is dropped.
pub struct FileSink {
    writer: NonBlocking,
    _guard: WorkerGuard,
}

impl FileSink {
    /// Open a rolling log file `<prefix>.<date>.log` under `dir`.
    pub fn open(
        dir: &Path,
        prefix: &str,
        rotation: LogRotation,
        max_files: usize,
    ) -> Result<Self, ConsoleError> {
        std::fs::create_dir_all(dir).map_err(|e| ConsoleError::LogFile {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let rotation = match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        };

        let appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(prefix)
            .filename_suffix("log")
            .max_log_files(max_files)
            .build(dir)
            .map_err(|e| ConsoleError::LogFile {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(dir = %dir.display(), prefix, "Console log file opened");
        Ok(Self::from_writer(appender))
    }

    /// Wrap any writer in the background worker.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        let (writer, guard) = tracing_appender::non_blocking(writer);
        Self {
            writer,
            _guard: guard,
        }
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink").finish_non_exhaustive()
    }
}

impl ConsoleSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write_flush(&self, flush: &ConsoleFlush) -> Result<(), SinkError> {
        if flush.file.is_empty() {
            return Ok(());
        }
        let clean = strip_ansi_codes(&flush.file);
        let mut writer = self.writer.clone();
        writer.write_all(clean.as_bytes())?;
        Ok(())
    }
}
