//! Chunked readers for child process pipes.
//!
//! Servers print partial lines (prompts, progress) and may emit bytes that
//! are not valid UTF-8. Output is therefore read in raw chunks rather than
//! lines, decoded lossily, and pushed to the console as-is; line assembly is
//! the engine's job.

use std::sync::Arc;

use srvcon_core::LineType;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::debug;

use super::sanitize::sanitize_process_output;
use crate::console::ConsoleLogger;

const READ_CHUNK: usize = 8 * 1024;

/// Lossy UTF-8 decoder that holds back an incomplete trailing sequence
/// until the next chunk arrives.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    carry: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` appended to whatever was held back last time.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.carry.len());
        let mut rest = self.carry.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.carry = rest.to_vec();
        out
    }

    /// Flush a held-back sequence at end of stream.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        tail
    }
}

/// Forward a child pipe into the console until EOF or a read error.
///
/// Returns the number of bytes read.
pub fn spawn_output_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    line_type: LineType,
    logger: Arc<ConsoleLogger>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut stream = stream;
        let mut buf = vec![0u8; READ_CHUNK];
        let mut decoder = Utf8Carry::new();
        let mut total = 0u64;

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    total += n as u64;
                    let text = decoder.decode(&buf[..n]);
                    push_sanitized(&logger, line_type, &text);
                }
                Err(e) => {
                    debug!(%line_type, error = %e, "Output reader exiting due to read error");
                    break;
                }
            }
        }

        push_sanitized(&logger, line_type, &decoder.finish());
        debug!(%line_type, bytes = total, "Output reader task exiting");
        total
    })
}

fn push_sanitized(logger: &ConsoleLogger, line_type: LineType, text: &str) {
    let clean = sanitize_process_output(text);
    if !clean.is_empty() {
        logger.push(line_type, clean.into_owned(), None);
    }
}
