//! Per-line-type styling for the three console encodings.
//!
//! Every line type maps to a fixed-width label (none for plain process
//! output) and to one SGR decoration per colored encoding. The file encoding
//! only ever carries the plain label.

use srvcon_core::LineType;

/// Width the prefix label is right-justified (and truncated) to.
pub const PREFIX_WIDTH: usize = 10;

/// SGR reset sequence.
pub const RESET: &str = "\x1b[0m";

/// Glyph rendered where an open line was cut short by the holdoff.
pub const FORCED_BREAK_GLYPH: &str = "\u{23ce}";

/// SGR used for the forced-break glyph in colored encodings.
pub const FORCED_BREAK_SGR: &str = "\x1b[2;33m";

/// SGR decoration for one encoding of a line type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    /// Applied to the prefix label.
    pub prefix: Option<&'static str>,
    /// Applied to line content.
    pub body: Option<&'static str>,
}

impl Paint {
    pub const PLAIN: Self = Self {
        prefix: None,
        body: None,
    };

    const fn new(prefix: &'static str, body: &'static str) -> Self {
        Self {
            prefix: Some(prefix),
            body: Some(body),
        }
    }
}

/// Full styling entry for a line type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    /// Label shown in the prefix; `None` means no prefix at all.
    pub label: Option<&'static str>,
    /// Browser-facing decoration.
    pub web: Paint,
    /// Terminal decoration.
    pub terminal: Paint,
}

/// Look up the style entry for a line type.
pub const fn line_style(line_type: LineType) -> LineStyle {
    match line_type {
        LineType::StdOut => LineStyle {
            label: None,
            web: Paint::PLAIN,
            terminal: Paint::PLAIN,
        },
        LineType::StdErr => LineStyle {
            label: Some("STDERR"),
            web: Paint::new("\x1b[1;91m", "\x1b[91m"),
            terminal: Paint::new("\x1b[41;97m", "\x1b[31m"),
        },
        LineType::AdminCmd => LineStyle {
            label: Some("ADMIN"),
            web: Paint::new("\x1b[1;96m", "\x1b[96m"),
            terminal: Paint::new("\x1b[46;30m", "\x1b[36m"),
        },
        LineType::SystemCmd => LineStyle {
            label: Some("SYSTEM"),
            web: Paint::new("\x1b[1;95m", "\x1b[95m"),
            terminal: Paint::new("\x1b[45;30m", "\x1b[35m"),
        },
        LineType::Info => LineStyle {
            label: Some("SRVCON"),
            web: Paint::new("\x1b[1;92m", "\x1b[92m"),
            terminal: Paint::new("\x1b[42;30m", "\x1b[32m"),
        },
    }
}

/// Plain prefix for a line, e.g. `"[    STDERR] "`.
///
/// Admin commands show the admin name from the context instead of the
/// generic label. Returns `None` for line types without a prefix.
pub fn prefix(line_type: LineType, context: Option<&str>) -> Option<String> {
    let label = line_style(line_type).label?;
    let shown = match (line_type, context) {
        (LineType::AdminCmd, Some(name)) if !name.trim().is_empty() => name.trim(),
        _ => label,
    };
    let shown: String = shown.chars().take(PREFIX_WIDTH).collect();
    Some(format!("[{shown:>PREFIX_WIDTH$}] "))
}

/// Append `text` wrapped in `sgr` (if any) to `out`.
pub fn paint_into(out: &mut String, sgr: Option<&str>, text: &str) {
    match sgr {
        Some(code) => {
            out.push_str(code);
            out.push_str(text);
            out.push_str(RESET);
        }
        None => out.push_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_has_no_prefix() {
        assert_eq!(prefix(LineType::StdOut, None), None);
        assert_eq!(line_style(LineType::StdOut).terminal, Paint::PLAIN);
    }

    #[test]
    fn test_prefix_is_fixed_width() {
        let err = prefix(LineType::StdErr, None).unwrap();
        let sys = prefix(LineType::SystemCmd, None).unwrap();
        assert_eq!(err, "[    STDERR] ");
        assert_eq!(err.chars().count(), sys.chars().count());
    }

    #[test]
    fn test_admin_prefix_uses_context() {
        assert_eq!(
            prefix(LineType::AdminCmd, Some("alice")).unwrap(),
            "[     alice] "
        );
        assert_eq!(
            prefix(LineType::AdminCmd, None).unwrap(),
            "[     ADMIN] "
        );
    }

    #[test]
    fn test_long_admin_names_are_truncated() {
        let p = prefix(LineType::AdminCmd, Some("a_very_long_admin_name")).unwrap();
        assert_eq!(p, "[a_very_lon] ");
    }

    #[test]
    fn test_every_prefixed_type_is_colored() {
        for line_type in LineType::ALL {
            let style = line_style(line_type);
            if style.label.is_some() {
                assert!(style.web.prefix.is_some(), "{line_type} web prefix");
                assert!(style.terminal.body.is_some(), "{line_type} terminal body");
            }
        }
    }

    #[test]
    fn test_paint_into_wraps_with_reset() {
        let mut out = String::new();
        paint_into(&mut out, Some("\x1b[31m"), "boom");
        assert_eq!(out, "\x1b[31mboom\x1b[0m");

        out.clear();
        paint_into(&mut out, None, "plain");
        assert_eq!(out, "plain");
    }
}
