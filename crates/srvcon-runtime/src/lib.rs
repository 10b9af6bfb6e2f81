//! Runtime half of the srvcon console.
//!
//! Turns interleaved, partial-line output from a managed server process,
//! admin commands and system events into ordered, prefixed lines, and fans
//! each flush out to a log file, the operator's terminal and live viewers.
//!
//! # Modules
//!
//! - [`console`] - Assembly engine, flush scheduling and the [`ConsoleLogger`] facade
//! - [`sinks`] - File, terminal and live-view destinations
//! - [`process`] - Child pipe readers and output sanitizing

#![deny(unsafe_code)]

pub mod console;
pub mod process;
pub mod sinks;

pub use console::{
    AssemblyEngine, ConsoleLogger, ConsoleLoggerBuilder, ConsoleStats, CycleOutcome, RecentBuffer,
    WebChunk, decode_markers, unescape_sentinel,
};
pub use process::{sanitize_process_output, spawn_output_reader};
pub use sinks::{FileSink, LiveSubscription, LiveViewSink, SinkSet, TerminalSink};
