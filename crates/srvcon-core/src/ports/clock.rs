//! Clock port.
//!
//! The engine needs two notions of time: a monotonic instant for the holdoff
//! timer and the wall-clock second for timestamp markers. Both are read
//! through this trait so tests can drive time by hand.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync + Debug {
    /// Monotonic instant used for holdoff measurement.
    fn now(&self) -> Instant;

    /// Current unix time in whole seconds.
    fn unix_seconds(&self) -> u64;
}

/// Type alias for a shared clock.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock.
///
/// The monotonic side follows tokio's clock, so a paused test runtime sees
/// virtual time advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn unix_seconds(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Hand-driven clock for tests.
///
/// Both readings start at fixed values and only move when [`advance`] is
/// called.
///
/// [`advance`]: ManualClock::advance
#[derive(Debug)]
pub struct ManualClock {
    base_instant: Instant,
    base_unix: u64,
    elapsed_ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock whose wall-clock reading starts at `unix_seconds`.
    pub fn new(unix_seconds: u64) -> Self {
        Self {
            base_instant: Instant::now(),
            base_unix: unix_seconds,
            elapsed_ms: AtomicU64::new(0),
        }
    }

    pub fn shared(unix_seconds: u64) -> Arc<Self> {
        Arc::new(Self::new(unix_seconds))
    }

    /// Move both readings forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(ms, Ordering::SeqCst);
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base_instant + self.elapsed()
    }

    fn unix_seconds(&self) -> u64 {
        self.base_unix + self.elapsed().as_secs()
    }
}
