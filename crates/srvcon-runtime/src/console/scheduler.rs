//! Ingest scheduler: coalesces pushes into periodic flush cycles.
//!
//! Producers only append to a shared queue and raise a dirty flag. A single
//! task owns the [`AssemblyEngine`] and, on every tick of a repeating timer,
//! runs one cycle if the flag is set or fragments are still waiting on the
//! holdoff. Cycles therefore never overlap, and a burst of pushes inside one
//! interval collapses into one flush.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use srvcon_core::{ConsoleError, ConsoleFlush, Fragment, LineType, SharedClock};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::engine::{AssemblyEngine, CycleOutcome};

/// Fragment queue shared between producers and the flush task.
#[derive(Debug, Default)]
pub struct IngestQueue {
    fragments: Mutex<Vec<Fragment>>,
    dirty: AtomicBool,
    pushed: AtomicU64,
}

impl IngestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and arm the next flush.
    pub fn push(&self, fragment: Fragment) {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fragment);
        self.pushed.fetch_add(1, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<Fragment> {
        std::mem::take(&mut *self.fragments.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clear and return the dirty flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fragments pushed over the queue's lifetime.
    pub fn total_pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }
}

/// One engine plus the wiring needed to run flush cycles.
///
/// Kept separate from the timer so a cycle can be driven by hand.
pub struct FlushCycle<F> {
    engine: AssemblyEngine,
    queue: Arc<IngestQueue>,
    clock: SharedClock,
    on_flush: F,
}

impl<F> FlushCycle<F>
where
    F: FnMut(ConsoleFlush, &CycleOutcome),
{
    pub fn new(
        engine: AssemblyEngine,
        queue: Arc<IngestQueue>,
        clock: SharedClock,
        on_flush: F,
    ) -> Self {
        Self {
            engine,
            queue,
            clock,
            on_flush,
        }
    }

    /// Run a cycle if there is work. Returns whether `on_flush` was called.
    pub fn run_once(&mut self) -> bool {
        let dirty = self.queue.take_dirty();
        if !dirty && !self.engine.has_pending() {
            return false;
        }

        let incoming = self.queue.drain();
        let mut outcome =
            self.engine
                .assemble(incoming, self.clock.now(), self.clock.unix_seconds());

        // Deferred fragments need another look once the holdoff moves on.
        if self.engine.has_pending() {
            self.queue.mark_dirty();
        }

        match outcome.flush.take() {
            Some(flush) => {
                (self.on_flush)(flush, &outcome);
                true
            }
            None => false,
        }
    }

    /// Drop fragments still waiting on the holdoff.
    pub fn discard_pending(&mut self) -> usize {
        self.engine.discard_pending()
    }

    pub fn engine(&self) -> &AssemblyEngine {
        &self.engine
    }
}

/// Timer-driven front end of the console.
///
/// `push` is non-blocking and safe from any thread; the flush task runs on
/// the tokio runtime the scheduler was spawned on.
pub struct IngestScheduler {
    queue: Arc<IngestQueue>,
    clock: SharedClock,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestScheduler {
    /// Spawn the flush task on the current tokio runtime.
    pub fn spawn<F>(
        engine: AssemblyEngine,
        period: Duration,
        clock: SharedClock,
        on_flush: F,
    ) -> Result<Self, ConsoleError>
    where
        F: FnMut(ConsoleFlush, &CycleOutcome) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConsoleError::NoRuntime)?;

        let queue = Arc::new(IngestQueue::new());
        let cancel = CancellationToken::new();
        let cycle = FlushCycle::new(engine, Arc::clone(&queue), Arc::clone(&clock), on_flush);
        let task = runtime.spawn(run_flush_loop(cycle, period, cancel.clone()));

        Ok(Self {
            queue,
            clock,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// Queue text from one source. Empty text is ignored.
    pub fn push(&self, line_type: LineType, text: impl Into<String>, context: Option<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.queue
            .push(Fragment::new(line_type, text, context, self.clock.now()));
    }

    pub fn queue(&self) -> &Arc<IngestQueue> {
        &self.queue
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the flush task and wait for it to finish.
    ///
    /// Whatever is ready gets one last flush; fragments still waiting on the
    /// holdoff are dropped.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!(error = %e, "Console flush task ended abnormally");
            }
        }
    }
}

impl Drop for IngestScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_flush_loop<F>(mut cycle: FlushCycle<F>, period: Duration, cancel: CancellationToken)
where
    F: FnMut(ConsoleFlush, &CycleOutcome) + Send + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(period = ?period, "Console flush loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cycle.run_once();
            }
            () = cancel.cancelled() => {
                cycle.run_once();
                let dropped = cycle.discard_pending();
                debug!(dropped, "Console flush loop stopped");
                break;
            }
        }
    }
}
