//! Console logger facade.
//!
//! [`ConsoleLogger`] is what the rest of the panel talks to: producers call
//! the `log_*` methods, viewers call [`ConsoleLogger::subscribe`], and the
//! flush task created at build time drives the engine and the sinks.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use srvcon_core::{
    ConsoleError, ConsoleFlush, ConsoleSettings, ConsoleSink, LineType, SharedClock, SystemClock,
    validate_settings,
};
use tracing::debug;

use super::engine::{AssemblyEngine, CycleOutcome};
use super::scheduler::IngestScheduler;
use crate::sinks::{FileSink, LiveSubscription, LiveViewSink, SinkSet, TerminalSink};

/// Usage counters for one console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleStats {
    pub fragments_pushed: u64,
    pub flushes: u64,
    pub forced_breaks: u64,
    pub markers: u64,
    pub web_bytes: u64,
    pub terminal_bytes: u64,
    pub file_bytes: u64,
    pub sink_failures: u64,
    /// Fragments left waiting on the holdoff after the latest flush.
    pub deferred: u64,
}

#[derive(Debug, Default)]
struct FlushCounters {
    flushes: AtomicU64,
    forced_breaks: AtomicU64,
    markers: AtomicU64,
    web_bytes: AtomicU64,
    terminal_bytes: AtomicU64,
    file_bytes: AtomicU64,
    deferred: AtomicU64,
}

impl FlushCounters {
    fn record(&self, flush: &ConsoleFlush, outcome: &CycleOutcome) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.forced_breaks
            .fetch_add(outcome.forced_breaks as u64, Ordering::Relaxed);
        if outcome.marker_inserted {
            self.markers.fetch_add(1, Ordering::Relaxed);
        }
        self.web_bytes
            .fetch_add(flush.web.len() as u64, Ordering::Relaxed);
        self.terminal_bytes
            .fetch_add(flush.terminal.len() as u64, Ordering::Relaxed);
        self.file_bytes
            .fetch_add(flush.file.len() as u64, Ordering::Relaxed);
        self.deferred
            .store(outcome.deferred as u64, Ordering::Relaxed);
    }
}

/// Builder for [`ConsoleLogger`].
pub struct ConsoleLoggerBuilder {
    settings: ConsoleSettings,
    clock: Option<SharedClock>,
    terminal: Option<Box<dyn Write + Send>>,
    sinks: Vec<Arc<dyn ConsoleSink>>,
}

impl ConsoleLoggerBuilder {
    pub fn new(settings: ConsoleSettings) -> Self {
        Self {
            settings,
            clock: None,
            terminal: None,
            sinks: Vec::new(),
        }
    }

    /// Use a specific clock instead of the system clock.
    #[must_use]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Send the terminal encoding somewhere other than stdout.
    #[must_use]
    pub fn terminal_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.terminal = Some(writer);
        self
    }

    /// Register an additional sink; it runs after the built-in ones.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Validate settings, open sinks and start the flush task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<ConsoleLogger, ConsoleError> {
        let settings = self.settings;
        validate_settings(&settings)?;

        let mut sinks = SinkSet::new();

        if let Some(dir) = settings.log_dir.as_deref() {
            let file = FileSink::open(
                dir,
                settings.effective_log_file_prefix(),
                settings.effective_rotation(),
                settings.effective_max_log_files(),
            )?;
            sinks.add(Arc::new(file));
        }

        let quiet = settings.effective_quiet();
        let terminal = Arc::new(match self.terminal {
            Some(writer) => TerminalSink::new(writer, quiet),
            None => TerminalSink::stdout(quiet),
        });
        sinks.add(terminal.clone());

        for sink in self.sinks {
            sinks.add(sink);
        }

        // Recent buffer is appended after every other sink has seen the flush.
        let live = Arc::new(LiveViewSink::new(
            settings.effective_recent_buffer_bytes(),
            settings.effective_recent_trim_bytes(),
        ));
        sinks.add(live.clone());

        let sinks = Arc::new(sinks);
        let counters = Arc::new(FlushCounters::default());
        let clock = self.clock.unwrap_or_else(SystemClock::shared);

        let on_flush = {
            let sinks = Arc::clone(&sinks);
            let counters = Arc::clone(&counters);
            move |flush: ConsoleFlush, outcome: &CycleOutcome| {
                counters.record(&flush, outcome);
                let failed = sinks.dispatch(&flush);
                debug!(
                    bytes = flush.total_len(),
                    web = flush.web.len(),
                    terminal = flush.terminal.len(),
                    file = flush.file.len(),
                    deferred = outcome.deferred,
                    failed,
                    "Console flush dispatched"
                );
            }
        };

        let scheduler = IngestScheduler::spawn(
            AssemblyEngine::new(settings.effective_holdoff()),
            settings.effective_flush_interval(),
            clock,
            on_flush,
        )?;

        debug!(sinks = ?sinks, quiet, "Console logger started");

        Ok(ConsoleLogger {
            scheduler,
            sinks,
            counters,
            terminal,
            live,
        })
    }
}

/// Handle to one logical console.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct ConsoleLogger {
    scheduler: IngestScheduler,
    sinks: Arc<SinkSet>,
    counters: Arc<FlushCounters>,
    terminal: Arc<TerminalSink>,
    live: Arc<LiveViewSink>,
}

impl ConsoleLogger {
    pub fn builder(settings: ConsoleSettings) -> ConsoleLoggerBuilder {
        ConsoleLoggerBuilder::new(settings)
    }

    /// Build with the given settings and no extra sinks.
    pub fn new(settings: ConsoleSettings) -> Result<Self, ConsoleError> {
        Self::builder(settings).build()
    }

    /// Queue a raw fragment.
    pub fn push(&self, line_type: LineType, text: impl Into<String>, context: Option<String>) {
        self.scheduler.push(line_type, text, context);
    }

    /// Raw chunk from the managed process's stdout.
    pub fn log_stdout(&self, text: impl Into<String>) {
        self.push(LineType::StdOut, text, None);
    }

    /// Raw chunk from the managed process's stderr.
    pub fn log_stderr(&self, text: impl Into<String>) {
        self.push(LineType::StdErr, text, None);
    }

    /// A command typed by `admin`, echoed as its own line.
    pub fn log_admin_command(&self, admin: &str, command: &str) {
        self.push(LineType::AdminCmd, as_line(command), Some(admin.to_string()));
    }

    /// A lifecycle event raised by the panel itself.
    pub fn log_system(&self, message: &str) {
        self.push(LineType::SystemCmd, as_line(message), None);
    }

    /// Informational line, e.g. the boot banner.
    pub fn log_info(&self, message: &str) {
        self.push(LineType::Info, as_line(message), None);
    }

    /// Current web-encoded recent output.
    pub fn recent_buffer(&self) -> String {
        self.live.snapshot()
    }

    /// Recent output plus a receiver for every later flush, taken atomically.
    pub fn subscribe(&self) -> LiveSubscription {
        self.live.subscribe()
    }

    pub fn set_quiet(&self, quiet: bool) {
        self.terminal.set_quiet(quiet);
    }

    pub fn stats(&self) -> ConsoleStats {
        let c = &self.counters;
        ConsoleStats {
            fragments_pushed: self.scheduler.queue().total_pushed(),
            flushes: c.flushes.load(Ordering::Relaxed),
            forced_breaks: c.forced_breaks.load(Ordering::Relaxed),
            markers: c.markers.load(Ordering::Relaxed),
            web_bytes: c.web_bytes.load(Ordering::Relaxed),
            terminal_bytes: c.terminal_bytes.load(Ordering::Relaxed),
            file_bytes: c.file_bytes.load(Ordering::Relaxed),
            sink_failures: self.sinks.failures().iter().map(|(_, n)| n).sum(),
            deferred: c.deferred.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stop the flush task. Fragments still held back by the holdoff are lost.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        debug!(stats = ?self.stats(), "Console logger stopped");
    }
}

impl std::fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("sinks", &self.sinks)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn as_line(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quiet_settings() -> ConsoleSettings {
        ConsoleSettings {
            quiet: Some(true),
            flush_interval_ms: Some(50),
            ..ConsoleSettings::default()
        }
    }

    #[test]
    fn test_as_line_appends_missing_newline() {
        assert_eq!(as_line("say hi"), "say hi\n");
        assert_eq!(as_line("done\n"), "done\n");
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let settings = ConsoleSettings {
            flush_interval_ms: Some(1),
            ..ConsoleSettings::default()
        };
        let err = ConsoleLogger::new(settings).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admin_command_lands_in_recent_buffer() {
        let logger = ConsoleLogger::new(quiet_settings()).unwrap();
        logger.log_admin_command("alice", "say hello");

        tokio::time::sleep(Duration::from_millis(120)).await;

        let recent = logger.recent_buffer();
        assert!(recent.contains("say hello"), "recent: {recent:?}");
        assert!(recent.contains("alice"));

        let stats = logger.stats();
        assert_eq!(stats.fragments_pushed, 1);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.markers, 1);
        assert_eq!(stats.sink_failures, 0);

        logger.shutdown().await;
        assert!(!logger.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_serialize_as_json() {
        let logger = ConsoleLogger::new(quiet_settings()).unwrap();
        let json = serde_json::to_value(logger.stats()).unwrap();
        assert_eq!(json["fragments_pushed"], 0);
        assert_eq!(json["sink_failures"], 0);
        logger.shutdown().await;
    }
}
