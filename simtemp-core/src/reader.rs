//! Reader interface
//!
//! A [`Reader`] is one consumer's view of the engine, comparable to an open
//! file: it pops samples, tracks which alerts it has already observed, and
//! owns an interrupt flag that another thread can raise to cancel a
//! blocking wait.
//!
//! ## Blocking read
//!
//! ```text
//! lock
//! while queue empty:
//!     non-blocking?  → WouldBlock
//!     interrupted?   → Interrupted
//!     wait(data_ready)          (lock released while asleep)
//! pop oldest → unlock → sample
//! ```
//!
//! ## Poll
//!
//! Pollers can register interest in data, alerts, or both. A poller that
//! only cares about alerts sleeps on the priority channel and is not woken
//! by ordinary ticks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use crate::engine::{Engine, EngineState, Readiness, Shared};
use crate::errors::{SimTempError, SimTempResult};
use crate::sample::Sample;
use crate::traits::Stream;

/// How a read behaves on an empty queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Sleep until a sample arrives or the read is interrupted
    Blocking,
    /// Fail with `WouldBlock` immediately
    NonBlocking,
}

/// What a poller wants to be woken for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interest {
    /// Wake when a sample is queued
    pub readable: bool,
    /// Wake when an alert fires
    pub priority: bool,
}

impl Interest {
    /// Data and alerts
    pub const BOTH: Self = Self {
        readable: true,
        priority: true,
    };
    /// Data only
    pub const READABLE: Self = Self {
        readable: true,
        priority: false,
    };
    /// Alerts only
    pub const PRIORITY: Self = Self {
        readable: false,
        priority: true,
    };
}

/// Cancels blocking calls on one [`Reader`]
///
/// Cloneable and `Send`, so it can be handed to whatever tears the consumer
/// down. The interrupt is consumed by the call it cancels.
#[derive(Clone)]
pub struct Interrupter {
    flag: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl Interrupter {
    /// Cancel the reader's current or next blocking wait
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
        // Taking the lock orders this store against a waiter that has
        // checked the flag but not yet gone to sleep.
        drop(self.shared.lock());
        self.shared.data_ready.notify_all();
        self.shared.priority_event.notify_all();
    }
}

/// One consumer of samples
pub struct Reader {
    engine: Engine,
    interrupted: Arc<AtomicBool>,
    /// Alert sequence number this reader has already reported
    seen_alert: AtomicU64,
}

impl Engine {
    /// Open a new reader
    ///
    /// Alerts raised before the reader existed are not reported to it.
    pub fn reader(&self) -> Reader {
        let seen = self.shared.lock().alert_seq;
        Reader {
            engine: self.clone(),
            interrupted: Arc::new(AtomicBool::new(false)),
            seen_alert: AtomicU64::new(seen),
        }
    }
}

impl Reader {
    /// Handle that can cancel this reader's blocking calls
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            flag: Arc::clone(&self.interrupted),
            shared: Arc::clone(&self.engine.shared),
        }
    }

    /// Engine this reader is attached to
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::AcqRel)
    }

    /// Remove and return the oldest sample
    pub fn read(&self, mode: ReadMode) -> SimTempResult<Sample> {
        let shared = &self.engine.shared;
        let mut state = shared.lock();

        loop {
            if let Some(sample) = state.queue.pop() {
                return Ok(sample);
            }
            if mode == ReadMode::NonBlocking {
                return Err(SimTempError::WouldBlock);
            }
            if self.take_interrupt() || state.closed {
                return Err(SimTempError::Interrupted);
            }
            state = shared.wait(&shared.data_ready, state);
        }
    }

    /// Non-blocking read in `nb` form
    pub fn try_read(&self) -> nb::Result<Sample, SimTempError> {
        match self.read(ReadMode::NonBlocking) {
            Ok(sample) => Ok(sample),
            Err(SimTempError::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn readiness_locked(&self, state: &EngineState) -> Readiness {
        Readiness {
            readable: !state.queue.is_empty(),
            priority: state.priority_since(self.seen_alert.load(Ordering::Acquire)),
        }
    }

    fn mark_alerts_seen(&self, state: &EngineState) {
        self.seen_alert.store(state.alert_seq, Ordering::Release);
    }

    /// Non-blocking readiness check
    ///
    /// `priority` is edge-style: it reports alerts raised since this reader
    /// last polled, then resets.
    pub fn poll_readiness(&self) -> Readiness {
        let state = self.engine.shared.lock();
        let readiness = self.readiness_locked(&state);
        self.mark_alerts_seen(&state);
        readiness
    }

    /// Sleep until something in `interest` is ready, or `timeout` passes
    ///
    /// Returns the readiness at wake-up, which may be empty on timeout.
    /// An empty interest returns an empty readiness at once. Fails with
    /// `Interrupted` if the interrupter fires or the engine is closed first.
    pub fn wait_ready(
        &self,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> SimTempResult<Readiness> {
        if !interest.readable && !interest.priority {
            return Ok(Readiness::default());
        }

        let shared = &self.engine.shared;
        let deadline = timeout.map(|t| Instant::now() + t);
        // Data pollers ride the data channel; alerts notify it too
        let channel = if interest.readable {
            &shared.data_ready
        } else {
            &shared.priority_event
        };

        let mut state: MutexGuard<'_, EngineState> = shared.lock();
        loop {
            let readiness = self.readiness_locked(&state);
            let hit = (interest.readable && readiness.readable)
                || (interest.priority && readiness.priority);
            if hit {
                if interest.priority {
                    self.mark_alerts_seen(&state);
                }
                return Ok(readiness);
            }
            if self.take_interrupt() || state.closed {
                return Err(SimTempError::Interrupted);
            }

            state = match deadline {
                None => shared.wait(channel, state),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(readiness);
                    }
                    shared.wait_timeout(channel, state, deadline - now)
                }
            };
        }
    }
}

impl Stream for Reader {
    type Item = Sample;
    type Error = SimTempError;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        self.try_read()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.engine.queue_len(), None)
    }
}
