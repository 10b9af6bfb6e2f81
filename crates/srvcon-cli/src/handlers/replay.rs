//! `srvcon replay`: render a captured web transcript.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use srvcon_runtime::{WebChunk, decode_markers, unescape_sentinel};

use crate::commands::ReplayArgs;

pub fn execute(args: &ReplayArgs) -> anyhow::Result<()> {
    let web = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read transcript {}", args.file.display()))?;

    let rendered = render_transcript(&web, args.utc);
    let mut out = std::io::stdout().lock();
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Replace marker tokens with readable timestamps and undo sentinel escaping.
pub fn render_transcript(web: &str, utc: bool) -> String {
    let mut out = String::with_capacity(web.len());
    for chunk in decode_markers(web) {
        match chunk {
            WebChunk::Text(text) => out.push_str(&unescape_sentinel(text)),
            WebChunk::Marker(secs) => {
                out.push_str("\x1b[2m[");
                out.push_str(&format_marker(secs, utc));
                out.push_str("]\x1b[0m ");
            }
        }
    }
    out
}

/// Timestamp for a marker; out-of-range values are shown as raw hex.
pub fn format_marker(secs: u64, utc: bool) -> String {
    let parsed = i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0));
    match parsed {
        Some(ts) if utc => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("0x{secs:x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvcon_runtime::console::marker_token;

    #[test]
    fn test_markers_become_timestamps() {
        let web = format!("{}hello\n", marker_token(1_700_000_000));
        assert_eq!(
            render_transcript(&web, true),
            "\x1b[2m[2023-11-14 22:13:20 UTC]\x1b[0m hello\n"
        );
    }

    #[test]
    fn test_escaped_sentinel_is_restored() {
        assert_eq!(render_transcript("cost 5\u{2e39}\n", true), "cost 5\u{a7}\n");
    }

    #[test]
    fn test_out_of_range_marker_shows_hex() {
        assert_eq!(format_marker(u64::MAX, true), "0xffffffffffffffff");
    }
}
