//! Fan-out over several sinks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use srvcon_core::{ConsoleFlush, ConsoleSink};
use tracing::warn;

struct Registered {
    sink: Arc<dyn ConsoleSink>,
    failures: AtomicU64,
}

/// Delivers every flush to each registered sink, in registration order.
///
/// A failing sink is logged and counted; the others still receive the flush.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Registered>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sink: Arc<dyn ConsoleSink>) {
        self.sinks.push(Registered {
            sink,
            failures: AtomicU64::new(0),
        });
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.add(sink);
        self
    }

    /// Hand `flush` to every sink. Returns how many failed.
    pub fn dispatch(&self, flush: &ConsoleFlush) -> usize {
        if flush.is_empty() {
            return 0;
        }
        let mut failed = 0;
        for entry in &self.sinks {
            if let Err(e) = entry.sink.write_flush(flush) {
                entry.failures.fetch_add(1, Ordering::Relaxed);
                failed += 1;
                warn!(sink = entry.sink.name(), error = %e, "Console sink failed");
            }
        }
        failed
    }

    /// Failure count per sink name.
    pub fn failures(&self) -> Vec<(&'static str, u64)> {
        self.sinks
            .iter()
            .map(|e| (e.sink.name(), e.failures.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|e| e.sink.name()))
            .finish()
    }
}
