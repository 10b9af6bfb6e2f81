//! Live view sink: recent-output buffer plus a broadcast channel.

use std::sync::{Arc, Mutex, PoisonError};

use srvcon_core::{ConsoleFlush, ConsoleSink, SinkError};
use tokio::sync::broadcast;

use crate::console::RecentBuffer;

/// Capacity of the live broadcast channel, in flushes.
const CHANNEL_CAPACITY: usize = 256;

/// Snapshot of recent output plus a receiver for everything after it.
#[derive(Debug)]
pub struct LiveSubscription {
    /// Web-encoded output up to the moment of subscribing.
    pub backlog: String,
    /// Web-encoded flushes published after the backlog was taken.
    pub receiver: broadcast::Receiver<Arc<str>>,
}

/// Keeps the bounded recent buffer and fans web output out to viewers.
///
/// Appending and broadcasting happen under one lock, and so do snapshotting
/// and subscribing, so a new viewer sees every flush exactly once.
#[derive(Debug)]
pub struct LiveViewSink {
    recent: Mutex<RecentBuffer>,
    sender: broadcast::Sender<Arc<str>>,
}

impl LiveViewSink {
    pub fn new(capacity: usize, trim: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            recent: Mutex::new(RecentBuffer::new(capacity, trim)),
            sender,
        }
    }

    /// Current recent-output buffer.
    pub fn snapshot(&self) -> String {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn subscribe(&self) -> LiveSubscription {
        let recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        LiveSubscription {
            backlog: recent.snapshot(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveViewSink {
    fn default() -> Self {
        Self::new(
            srvcon_core::DEFAULT_RECENT_BUFFER_BYTES,
            srvcon_core::DEFAULT_RECENT_TRIM_BYTES,
        )
    }
}

impl ConsoleSink for LiveViewSink {
    fn name(&self) -> &'static str {
        "live"
    }

    fn write_flush(&self, flush: &ConsoleFlush) -> Result<(), SinkError> {
        if flush.web.is_empty() {
            return Ok(());
        }
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.append(&flush.web);
        // No receivers is not an error.
        let _ = self.sender.send(Arc::from(flush.web.as_str()));
        Ok(())
    }
}
