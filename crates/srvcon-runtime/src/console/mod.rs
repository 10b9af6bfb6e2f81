//! Console assembly pipeline.
//!
//! # Structure
//!
//! - `engine` - Line assembly across interleaved sources
//! - `render` / `style` - One-pass projection into web, terminal and file text
//! - `marker` - Inline per-second timestamp tokens for the web encoding
//! - `recent` - Bounded replay buffer for late-joining viewers
//! - `scheduler` - Timer-driven coalescing of pushes into flush cycles
//! - `logger` - Facade tying the pipeline to its sinks

mod engine;
mod logger;
mod marker;
mod recent;
mod render;
mod scheduler;
mod style;

pub use engine::{AssemblyEngine, CycleOutcome, LastLineState};
pub use logger::{ConsoleLogger, ConsoleLoggerBuilder, ConsoleStats};
pub use marker::{
    MARKER_SENTINEL, MarkerClock, SENTINEL_ESCAPE, WebChunk, decode_markers, marker_token,
    unescape_sentinel,
};
pub use recent::RecentBuffer;
pub use render::{Encoding, OutputBuffers, Segment};
pub use scheduler::{FlushCycle, IngestQueue, IngestScheduler};
pub use style::{FORCED_BREAK_GLYPH, PREFIX_WIDTH};
