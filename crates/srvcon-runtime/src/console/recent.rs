//! Bounded store of recent web-encoded output for late-joining viewers.

use srvcon_core::{DEFAULT_RECENT_BUFFER_BYTES, DEFAULT_RECENT_TRIM_BYTES};

/// Most recent web output, capped in size.
///
/// When an append pushes the buffer over capacity, a fixed slice is cut from
/// the front and the head then advances to the next line start, so a
/// snapshot never begins mid-line.
#[derive(Debug)]
pub struct RecentBuffer {
    buf: String,
    capacity: usize,
    trim: usize,
}

impl RecentBuffer {
    /// Create an empty buffer. `trim` is clamped to at least one byte.
    pub fn new(capacity: usize, trim: usize) -> Self {
        Self {
            buf: String::new(),
            capacity,
            trim: trim.max(1),
        }
    }

    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
        while self.buf.len() > self.capacity {
            self.trim_front();
        }
    }

    fn trim_front(&mut self) {
        let mut cut = self.trim.min(self.buf.len());
        while !self.buf.is_char_boundary(cut) {
            cut += 1;
        }

        // Already at a line start: nothing more to skip.
        if cut == 0 || self.buf.as_bytes()[cut - 1] == b'\n' {
            self.buf.drain(..cut);
            return;
        }

        match self.buf[cut..].find('\n') {
            Some(pos) => {
                self.buf.drain(..cut + pos + 1);
            }
            // The rest is one unterminated line; none of it can be shown
            // without a truncated head.
            None => self.buf.clear(),
        }
    }

    /// Current contents, verbatim.
    pub fn snapshot(&self) -> String {
        self.buf.clone()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_BUFFER_BYTES, DEFAULT_RECENT_TRIM_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize) -> String {
        (0..count).map(|i| format!("line {i:05}\n")).collect()
    }

    #[test]
    fn test_small_appends_are_kept_verbatim() {
        let mut recent = RecentBuffer::new(1024, 128);
        recent.append("hello ");
        recent.append("world\n");
        assert_eq!(recent.snapshot(), "hello world\n");
    }

    #[test]
    fn test_trim_keeps_size_within_cap() {
        let mut recent = RecentBuffer::new(1024, 256);
        for _ in 0..20 {
            recent.append(&numbered_lines(10));
            assert!(recent.len() <= recent.capacity());
        }
    }

    #[test]
    fn test_snapshot_starts_at_line_boundary() {
        let mut recent = RecentBuffer::new(1000, 100);
        let input = numbered_lines(200);
        for chunk in input.as_bytes().chunks(37) {
            recent.append(std::str::from_utf8(chunk).unwrap());
            let snap = recent.snapshot();
            if !snap.is_empty() {
                assert!(snap.starts_with("line "), "mid-line head: {snap:.20}");
            }
        }
        assert!(recent.snapshot().ends_with("line 00199\n"));
    }

    #[test]
    fn test_cut_on_line_start_does_not_drop_extra_line() {
        // 11 bytes per line; the trim slice lands exactly after line 0.
        let mut recent = RecentBuffer::new(30, 11);
        recent.append(&numbered_lines(3));
        assert_eq!(recent.snapshot(), "line 00001\nline 00002\n");
    }

    #[test]
    fn test_unterminated_tail_is_dropped_when_no_boundary_remains() {
        let mut recent = RecentBuffer::new(16, 4);
        recent.append(&"x".repeat(40));
        assert!(recent.is_empty());
    }

    #[test]
    fn test_trim_respects_multibyte_chars() {
        let mut recent = RecentBuffer::new(20, 3);
        recent.append("\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\n");
        recent.append("ok line\n");
        recent.append("another\n");
        assert!(recent.len() <= 20);
        assert!(recent.snapshot().ends_with("another\n"));
    }
}
