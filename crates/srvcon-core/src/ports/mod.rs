//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the console engine expects from its
//! surroundings. They contain no implementation details and use only domain
//! types.
//!
//! # Design Rules
//!
//! - Sinks are synchronous and must not block for long; slow transports buffer
//!   on their own side
//! - Time is always read through [`Clock`] so engine tests are deterministic

pub mod clock;
pub mod console_sink;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use console_sink::{ConsoleSink, SinkError};
