//! Output sinks for console flushes.
//!
//! Each sink takes the encoding it cares about from a [`ConsoleFlush`]:
//!
//! - `FileSink` - plain text appended to a rolling log file
//! - `TerminalSink` - colored text written to the operator's terminal
//! - `LiveViewSink` - web text kept for replay and broadcast to live viewers
//! - `SinkSet` - fan-out over any number of sinks
//!
//! [`ConsoleFlush`]: srvcon_core::ConsoleFlush

mod file;
mod live;
mod set;
mod terminal;

pub use file::{FileSink, strip_ansi_codes};
pub use live::{LiveSubscription, LiveViewSink};
pub use set::SinkSet;
pub use terminal::TerminalSink;
