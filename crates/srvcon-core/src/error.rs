//! Construction-time errors for console loggers.
//!
//! Only building a logger can fail. Once running, sink failures are counted
//! rather than returned, and the engine itself has no runtime error path.

use std::path::PathBuf;

use thiserror::Error;

use crate::settings::SettingsError;

/// Error raised while constructing a console logger or one of its sinks.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Settings failed validation.
    #[error("Invalid console configuration: {0}")]
    InvalidConfig(#[from] SettingsError),

    /// The rotating log file could not be opened.
    #[error("Failed to initialize log file in {}: {message}", .path.display())]
    LogFile {
        /// Directory the log file was to be created in.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },

    /// The logger must be built inside a tokio runtime.
    #[error("Console logger requires a running tokio runtime")]
    NoRuntime,
}
