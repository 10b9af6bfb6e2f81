//! Control-character filtering for child process output.

use std::borrow::Cow;

const fn is_disallowed(c: char) -> bool {
    match c {
        '\n' | '\t' | '\x1b' => false,
        '\0'..='\x1f' | '\x7f' => true,
        _ => false,
    }
}

/// Strip control characters a console must not pass through.
///
/// Keeps `\n`, `\t` and ESC (so color sequences survive). Carriage returns
/// are dropped, which turns `\r\n` into `\n`; this also holds when the pair
/// is split across two chunks.
pub fn sanitize_process_output(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_disallowed) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|&c| !is_disallowed(c)).collect())
}
