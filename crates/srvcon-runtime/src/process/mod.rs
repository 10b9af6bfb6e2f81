//! Plumbing between a managed child process and the console.

mod sanitize;
mod stream;

pub use sanitize::sanitize_process_output;
pub use stream::{Utf8Carry, spawn_output_reader};
