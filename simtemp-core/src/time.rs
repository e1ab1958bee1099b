//! Clock abstraction for sample timestamps
//!
//! Timestamps are nanoseconds on a monotonic clock. The engine reads its
//! clock once per tick, under the state lock.
//!
//! - `MonotonicClock`: nanoseconds since the clock was created
//! - `ManualClock`: shared, settable clock for deterministic tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Nanosecond timestamp
pub type Timestamp = u64;

/// Source of sample timestamps
///
/// `now_ns()` is called from the ticker thread while the engine lock is
/// held, so it must be cheap and must not block.
pub trait ClockSource: Send {
    /// Current time in nanoseconds
    fn now_ns(&self) -> Timestamp;

    /// True if the clock never goes backwards
    fn is_monotonic(&self) -> bool;
}

/// Monotonic clock backed by `std::time::Instant`
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now_ns(&self) -> Timestamp {
        // u64 nanoseconds covers ~584 years of uptime
        self.origin.elapsed().as_nanos() as Timestamp
    }

    fn is_monotonic(&self) -> bool {
        true
    }
}

/// Hand-driven clock for tests
///
/// Clones share the same counter, so a test can keep one handle and give
/// another to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock reading `start_ns`
    pub fn new(start_ns: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, ns: Timestamp) {
        self.now.store(ns, Ordering::Release);
    }

    /// Move forward by `ns`
    pub fn advance(&self, ns: u64) {
        self.now.fetch_add(ns, Ordering::AcqRel);
    }
}

impl ClockSource for ManualClock {
    fn now_ns(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }

    fn is_monotonic(&self) -> bool {
        false
    }
}
