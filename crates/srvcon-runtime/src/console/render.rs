//! Projection of styled segments into the three console encodings.
//!
//! The engine walks fragment text once and describes it as a sequence of
//! [`Segment`]s; each [`Encoding`] then renders those segments with its own
//! decoration. Content is identical across encodings by construction.

use srvcon_core::{ConsoleFlush, LineType};

use super::marker::escape_sentinel_into;
use super::style::{self, FORCED_BREAK_GLYPH, FORCED_BREAK_SGR, paint_into};

/// One styled unit of console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A physical line begins; renders the line type's prefix, if any.
    LineStart {
        line_type: LineType,
        context: Option<&'a str>,
    },
    /// Line content without any line break.
    Text { line_type: LineType, text: &'a str },
    /// Line break ending the current physical line.
    LineEnd,
    /// Visible marker for a line cut short, followed by a line break.
    ForcedBreak,
}

/// The three output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Web,
    Terminal,
    File,
}

impl Encoding {
    pub const ALL: [Self; 3] = [Self::Web, Self::Terminal, Self::File];

    /// Render one segment onto `out`.
    pub fn render(self, segment: &Segment<'_>, out: &mut String) {
        match *segment {
            Segment::LineStart { line_type, context } => {
                let Some(prefix) = style::prefix(line_type, context) else {
                    return;
                };
                let paint = style::line_style(line_type);
                match self {
                    Self::Web => {
                        let mut escaped = String::with_capacity(prefix.len());
                        escape_sentinel_into(&mut escaped, &prefix);
                        paint_into(out, paint.web.prefix, &escaped);
                    }
                    Self::Terminal => paint_into(out, paint.terminal.prefix, &prefix),
                    Self::File => out.push_str(&prefix),
                }
            }
            Segment::Text { line_type, text } => {
                let paint = style::line_style(line_type);
                match self {
                    Self::Web => {
                        let mut escaped = String::with_capacity(text.len());
                        escape_sentinel_into(&mut escaped, text);
                        paint_into(out, paint.web.body, &escaped);
                    }
                    Self::Terminal => paint_into(out, paint.terminal.body, text),
                    Self::File => out.push_str(text),
                }
            }
            Segment::LineEnd => out.push('\n'),
            Segment::ForcedBreak => {
                match self {
                    Self::Web | Self::Terminal => {
                        paint_into(out, Some(FORCED_BREAK_SGR), FORCED_BREAK_GLYPH);
                    }
                    Self::File => out.push_str(FORCED_BREAK_GLYPH),
                }
                out.push('\n');
            }
        }
    }
}

/// Per-cycle output buffers, one per encoding.
#[derive(Debug, Default)]
pub struct OutputBuffers {
    pub web: String,
    pub terminal: String,
    pub file: String,
}

impl OutputBuffers {
    /// Render a segment into all three buffers.
    pub fn push(&mut self, segment: Segment<'_>) {
        for encoding in Encoding::ALL {
            encoding.render(&segment, self.buffer_mut(encoding));
        }
    }

    fn buffer_mut(&mut self, encoding: Encoding) -> &mut String {
        match encoding {
            Encoding::Web => &mut self.web,
            Encoding::Terminal => &mut self.terminal,
            Encoding::File => &mut self.file,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.web.is_empty() && self.terminal.is_empty() && self.file.is_empty()
    }

    /// Take the buffers, leaving them empty.
    pub fn take(&mut self) -> ConsoleFlush {
        let buffers = std::mem::take(self);
        ConsoleFlush {
            web: buffers.web,
            terminal: buffers.terminal,
            file: buffers.file,
        }
    }
}

/// Emit segments for `text` written by one source.
///
/// `at_line_start` says whether the first character begins a new physical
/// line (and so gets a prefix). Returns whether the text ended at a line
/// start, i.e. whether it finished with a line break.
pub fn emit_text(
    out: &mut OutputBuffers,
    line_type: LineType,
    context: Option<&str>,
    text: &str,
    mut at_line_start: bool,
) -> bool {
    for piece in text.split_inclusive('\n') {
        let (body, ends_line) = match piece.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (piece, false),
        };
        if at_line_start {
            out.push(Segment::LineStart { line_type, context });
        }
        if !body.is_empty() {
            out.push(Segment::Text {
                line_type,
                text: body,
            });
        }
        if ends_line {
            out.push(Segment::LineEnd);
        }
        at_line_start = ends_line;
    }
    at_line_start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_stdout_renders_identically() {
        let mut out = OutputBuffers::default();
        emit_text(&mut out, LineType::StdOut, None, "hello\nworld", true);
        assert_eq!(out.file, "hello\nworld");
        assert_eq!(out.terminal, "hello\nworld");
        assert_eq!(out.web, "hello\nworld");
    }

    #[test]
    fn test_prefix_repeats_on_every_sub_line() {
        let mut out = OutputBuffers::default();
        let ended = emit_text(&mut out, LineType::StdErr, None, "a\nb\n", true);
        assert!(ended);
        assert_eq!(out.file, "[    STDERR] a\n[    STDERR] b\n");
        assert!(out.terminal.contains("\x1b[31ma\x1b[0m"));
    }

    #[test]
    fn test_continuation_has_no_leading_prefix() {
        let mut out = OutputBuffers::default();
        let ended = emit_text(&mut out, LineType::StdErr, None, " tail\nnext", false);
        assert!(!ended);
        assert_eq!(out.file, " tail\n[    STDERR] next");
    }

    #[test]
    fn test_web_escapes_sentinel_in_content() {
        let mut out = OutputBuffers::default();
        emit_text(&mut out, LineType::StdOut, None, "cost: 5\u{a7}\n", true);
        assert_eq!(out.web, "cost: 5\u{2e39}\n");
        assert_eq!(out.file, "cost: 5\u{a7}\n");
    }

    #[test]
    fn test_forced_break_in_every_encoding() {
        let mut out = OutputBuffers::default();
        out.push(Segment::ForcedBreak);
        assert_eq!(out.file, "\u{23ce}\n");
        assert!(out.web.contains('\u{23ce}'));
        assert!(out.terminal.ends_with("\x1b[0m\n"));
    }

    #[test]
    fn test_take_resets_buffers() {
        let mut out = OutputBuffers::default();
        out.push(Segment::LineEnd);
        let flush = out.take();
        assert_eq!(flush.file, "\n");
        assert!(out.is_empty());
    }
}
