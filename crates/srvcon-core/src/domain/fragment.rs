//! Fragments: raw text chunks tagged with their logical source.

use std::fmt;
use std::time::Instant;

use super::LineType;

/// Identity of a logical writer.
///
/// Two fragments may share an output line only if their source keys are
/// equal. The key is derived from the line type and the optional context, so
/// commands from two different admins never merge into one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey(String);

impl SourceKey {
    /// Derive the key for a line type and optional context.
    pub fn derive(line_type: LineType, context: Option<&str>) -> Self {
        match context {
            Some(ctx) => Self(format!("{}:{}", line_type.as_str(), ctx)),
            None => Self(line_type.as_str().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `push()`-delivered chunk of console text.
///
/// Text is arbitrary: it may hold part of a line, several lines, or end
/// mid-line. A fragment stays queued across flush cycles while it waits for
/// another source's open line to finish; `pending_since` records when that
/// wait started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub source_key: SourceKey,
    pub line_type: LineType,
    pub text: String,
    pub context: Option<String>,
    pub enqueued_at: Instant,
    pub pending_since: Option<Instant>,
}

impl Fragment {
    /// Create a fresh fragment.
    pub fn new(
        line_type: LineType,
        text: impl Into<String>,
        context: Option<String>,
        enqueued_at: Instant,
    ) -> Self {
        Self {
            source_key: SourceKey::derive(line_type, context.as_deref()),
            line_type,
            text: text.into(),
            context,
            enqueued_at,
            pending_since: None,
        }
    }

    /// True when the fragment carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text ends on a line break.
    pub fn ends_line(&self) -> bool {
        self.text.ends_with('\n')
    }

    /// Whether the fragment has waited longer than `holdoff` at `now`.
    pub fn is_stale(&self, now: Instant, holdoff: std::time::Duration) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) > holdoff)
    }
}
