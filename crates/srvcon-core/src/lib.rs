//! Core domain types and ports for the srvcon live console.
//!
//! This crate holds everything the console assembly engine and its adapters
//! agree on, with no I/O of its own:
//!
//! - [`domain`] - line types, source keys, fragments and flush payloads
//! - [`ports`] - the clock and sink abstractions the runtime plugs into
//! - [`settings`] - console configuration with defaults and validation
//! - [`error`] - construction-time errors
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{ConsoleFlush, Fragment, LineType, ParseLineTypeError, SourceKey};
pub use error::ConsoleError;
pub use ports::{Clock, ConsoleSink, ManualClock, SharedClock, SinkError, SystemClock};
pub use settings::{
    ConsoleSettings, ConsoleSettingsUpdate, DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_HOLDOFF_MS,
    DEFAULT_RECENT_BUFFER_BYTES, DEFAULT_RECENT_TRIM_BYTES, LogRotation, SettingsError,
    validate_settings,
};

// Dev-dependency only exercised by settings tests
#[cfg(test)]
use tempfile as _;
