//! Console sink port.
//!
//! A sink is the destination for one encoding of a flush: the rotating log
//! file, the panel's own terminal, or the live-view broadcast. Sinks are
//! invoked from the flush cycle and must return quickly; failures are
//! reported back so the owner can count them, but never reach the engine.

use thiserror::Error;

use crate::domain::ConsoleFlush;

/// Error raised by a sink while disposing of a flush.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// Writing to the underlying destination failed.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "broken pipe").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The sink's destination is gone (e.g. the writer thread exited).
    #[error("Sink closed: {0}")]
    Closed(String),
}

impl SinkError {
    /// Capture a `std::io::Error` by kind and message.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Destination for flushed console output.
///
/// Implementations pick the encoding they care about from the flush.
pub trait ConsoleSink: Send + Sync {
    /// Short name used in diagnostics and failure counters.
    fn name(&self) -> &'static str;

    /// Dispose of one flush.
    fn write_flush(&self, flush: &ConsoleFlush) -> Result<(), SinkError>;
}
