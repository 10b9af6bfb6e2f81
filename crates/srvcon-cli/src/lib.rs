//! Command-line front end for the srvcon console.
//!
//! `srvcon run` wraps a server process and assembles its output together
//! with operator commands; `srvcon replay` renders a captured web transcript
//! with readable timestamps.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary target only.
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

pub use bootstrap::{init_tracing, resolve_settings};
pub use commands::{Commands, ReplayArgs, RunArgs};
pub use parser::Cli;
