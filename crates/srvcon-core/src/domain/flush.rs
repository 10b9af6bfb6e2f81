//! Flush payload handed to console sinks.

use serde::{Deserialize, Serialize};

/// The three encodings produced by one flush cycle.
///
/// All three carry the same logical content; they differ only in styling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleFlush {
    /// Browser-facing stream with inline time markers and SGR colors.
    pub web: String,
    /// Terminal stream with SGR colors.
    pub terminal: String,
    /// Plain stream; may still carry SGR codes from the process itself,
    /// which the file sink strips.
    pub file: String,
}

impl ConsoleFlush {
    pub fn is_empty(&self) -> bool {
        self.web.is_empty() && self.terminal.is_empty() && self.file.is_empty()
    }

    /// Total bytes across all three encodings.
    pub fn total_len(&self) -> usize {
        self.web.len() + self.terminal.len() + self.file.len()
    }
}
