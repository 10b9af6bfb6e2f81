//! Inline timestamp markers for the web encoding.
//!
//! A marker is the token `{§<hex>}` carrying the unix time in seconds as
//! lowercase hex. It is spliced into the web text right before the first line
//! that starts in a given wall-clock second, so a replay of the raw text
//! recovers approximate timing without any side index.
//!
//! Content is escaped so a literal sentinel can never be mistaken for a
//! marker: every `§` in console text is replaced by `⸹` (U+2E39).

use std::fmt::Write as _;

/// Character that opens a marker token after `{`.
pub const MARKER_SENTINEL: char = '\u{a7}';

/// Replacement for literal sentinels in console content.
pub const SENTINEL_ESCAPE: char = '\u{2e39}';

/// Build the marker token for a unix second.
pub fn marker_token(unix_seconds: u64) -> String {
    let mut token = String::with_capacity(16);
    token.push('{');
    token.push(MARKER_SENTINEL);
    let _ = write!(token, "{unix_seconds:x}");
    token.push('}');
    token
}

/// Append `text` to `out`, escaping literal sentinels.
pub fn escape_sentinel_into(out: &mut String, text: &str) {
    if !text.contains(MARKER_SENTINEL) {
        out.push_str(text);
        return;
    }
    out.extend(text.chars().map(|c| {
        if c == MARKER_SENTINEL {
            SENTINEL_ESCAPE
        } else {
            c
        }
    }));
}

/// Reverse [`escape_sentinel_into`] for display.
///
/// Lossy for content that contained `⸹` to begin with.
pub fn unescape_sentinel(text: &str) -> String {
    text.replace(SENTINEL_ESCAPE, &MARKER_SENTINEL.to_string())
}

/// Piece of a decoded web transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebChunk<'a> {
    Text(&'a str),
    Marker(u64),
}

/// Split web-encoded text into content runs and marker timestamps.
///
/// Anything that looks like a token but does not parse is kept as text.
pub fn decode_markers(web: &str) -> Vec<WebChunk<'_>> {
    let opener = {
        let mut s = String::from("{");
        s.push(MARKER_SENTINEL);
        s
    };

    let mut chunks = Vec::new();
    let mut rest = web;
    let mut text_start = 0usize;
    let mut consumed = 0usize;

    while let Some(pos) = rest.find(&opener) {
        let after = &rest[pos + opener.len()..];
        let parsed = after.find('}').and_then(|end| {
            let hex = &after[..end];
            let valid = !hex.is_empty()
                && hex.len() <= 16
                && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
            valid
                .then(|| u64::from_str_radix(hex, 16).ok())
                .flatten()
                .map(|secs| (secs, opener.len() + end + 1))
        });

        let absolute = consumed + pos;
        match parsed {
            Some((secs, token_len)) => {
                if absolute > text_start {
                    chunks.push(WebChunk::Text(&web[text_start..absolute]));
                }
                chunks.push(WebChunk::Marker(secs));
                text_start = absolute + token_len;
                consumed = text_start;
                rest = &web[consumed..];
            }
            None => {
                let skip = pos + opener.len();
                consumed += skip;
                rest = &web[consumed..];
            }
        }
    }

    if text_start < web.len() {
        chunks.push(WebChunk::Text(&web[text_start..]));
    }
    chunks
}

/// Decides once per flush cycle whether a marker is due and where it goes.
#[derive(Debug, Default)]
pub struct MarkerClock {
    last_marker_second: Option<u64>,
    current_second: u64,
    due: bool,
    insert_offset: Option<usize>,
}

impl MarkerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flush cycle at `unix_seconds`.
    pub fn begin_cycle(&mut self, unix_seconds: u64) {
        self.current_second = unix_seconds;
        self.due = self.last_marker_second != Some(unix_seconds);
        self.insert_offset = None;
    }

    /// Called when a new line starts at `web_offset`. Records the offset if
    /// a marker is due and none has been placed this cycle.
    pub fn claim(&mut self, web_offset: usize) {
        if self.due && self.insert_offset.is_none() {
            self.insert_offset = Some(web_offset);
            self.due = false;
        }
    }

    pub fn is_due(&self) -> bool {
        self.due
    }

    /// End the cycle, splicing the marker into `web` if one was claimed.
    ///
    /// Returns whether a marker was inserted. A claimed offset is dropped
    /// when `web` ended up empty, leaving the marker due for a later cycle.
    pub fn finish_cycle(&mut self, web: &mut String) -> bool {
        let Some(offset) = self.insert_offset.take() else {
            return false;
        };
        if web.is_empty() || offset > web.len() || !web.is_char_boundary(offset) {
            return false;
        }
        web.insert_str(offset, &marker_token(self.current_second));
        self.last_marker_second = Some(self.current_second);
        true
    }

    pub fn last_marker_second(&self) -> Option<u64> {
        self.last_marker_second
    }
}
