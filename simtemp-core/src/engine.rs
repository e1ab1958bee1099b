//! Engine State and Lock Discipline
//!
//! ## Overview
//!
//! Everything mutable about the simulated sensor lives in one
//! [`EngineState`] behind one `Mutex`. The ticker, the control plane and
//! every reader take the same lock; there is no reader/writer split.
//!
//! ```text
//!            ┌──────────── Mutex<EngineState> ────────────┐
//! Ticker ──→ │ config · ramp · current temp · queue · stats│ ←── Control plane
//!            └──────────────────────┬─────────────────────┘
//!                                   │ notify after unlock
//!                 ┌─────────────────┴──────────────────┐
//!            data_ready (every tick)        priority_event (alerts only)
//!                 ↓                                     ↓
//!            blocking readers                 priority-only pollers
//! ```
//!
//! ## Rules
//!
//! 1. The lock is held only while inspecting or mutating state, never while
//!    sleeping. Condition variable waits release it.
//! 2. Notifications are sent after the guard is dropped.
//! 3. Every wait sits in a loop that re-checks its condition, so spurious
//!    wake-ups and interrupts are handled in one place.
//!
//! ## Tick
//!
//! One tick, executed with the lock held:
//!
//! ```text
//! timestamp ← clock
//! new_temp  ← signal model(mode, ramp)
//! alert     ← previous_temp > threshold && new_temp >= threshold
//! current_temp ← new_temp
//! enqueue sample (or count an overflow)
//! ```
//!
//! The alert test looks at the stored temperature *before* this tick, so it
//! keeps firing on every tick while the signal stays above the threshold.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Configuration, InitialConfig, INITIAL_TEMPERATURE_MC};
use crate::errors::SimTempResult;
use crate::queue::{SampleQueue, QUEUE_CAPACITY};
use crate::sample::Sample;
use crate::signal::{next_temperature, Mode, RampState};
use crate::stats::Statistics;
use crate::time::{ClockSource, MonotonicClock};

/// Alert condition evaluated on every tick
///
/// Fires when the previous stored temperature was strictly above the
/// threshold and the new one is at or above it. This is a sustained-above
/// test: it does not re-arm after the signal dips below the threshold,
/// because it never needed to be armed in the first place.
pub const fn alert_raised(previous_mc: i32, new_mc: i32, threshold_mc: i32) -> bool {
    previous_mc > threshold_mc && new_mc >= threshold_mc
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// The sample that was generated
    pub sample: Sample,
    /// Whether this tick raised an alert
    pub alert: bool,
    /// False if the queue was full and the sample was dropped
    pub enqueued: bool,
}

/// Readiness snapshot used by poll-style callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    /// At least one sample is queued
    pub readable: bool,
    /// An alert is pending for this observer
    pub priority: bool,
}

/// Ticker bookkeeping, owned by the state so reschedules are linearized
#[derive(Debug, Clone, Copy)]
pub(crate) struct Schedule {
    /// A ticker thread is attached
    pub(crate) active: bool,
    /// When the next tick is due
    pub(crate) next_tick: Instant,
}

/// All mutable engine state, guarded by one lock
pub(crate) struct EngineState {
    pub(crate) config: Configuration,
    pub(crate) ramp: RampState,
    pub(crate) current_temperature_mc: i32,
    pub(crate) queue: SampleQueue<QUEUE_CAPACITY>,
    pub(crate) stats: Statistics,
    /// Latched when an alert fires, cleared by a threshold change
    pub(crate) threshold_crossed: bool,
    /// Number of alerts raised so far; readers compare against it
    pub(crate) alert_seq: u64,
    /// Alerts at or below this sequence are no longer reported
    pub(crate) alert_floor: u64,
    pub(crate) schedule: Schedule,
    /// Set at teardown; blocked readers give up
    pub(crate) closed: bool,
    rng: StdRng,
    clock: Box<dyn ClockSource>,
}

impl EngineState {
    /// Run one tick with the lock held
    pub(crate) fn tick(&mut self) -> TickOutcome {
        let timestamp_ns = self.clock.now_ns();
        let new_temp = next_temperature(self.config.mode, &mut self.ramp, &mut self.rng);

        let alert = alert_raised(self.current_temperature_mc, new_temp, self.config.threshold_mc);
        if alert {
            self.stats.record_alert();
            self.threshold_crossed = true;
            self.alert_seq += 1;
        }

        self.current_temperature_mc = new_temp;

        let sample = Sample::new(timestamp_ns, new_temp, alert);
        let enqueued = match self.queue.push(sample) {
            Ok(()) => {
                self.stats.record_produced();
                true
            }
            Err(_) => {
                self.stats.record_overflow();
                debug!(
                    "queue full, dropped sample at {} ns ({} drops)",
                    timestamp_ns, self.stats.queue_overflow_errors
                );
                false
            }
        };

        TickOutcome {
            sample,
            alert,
            enqueued,
        }
    }

    /// Priority edge for an observer that has seen alerts up to `seen`
    pub(crate) fn priority_since(&self, seen: u64) -> bool {
        self.alert_seq > seen.max(self.alert_floor)
    }
}

/// Lock and condition variables shared by every engine handle
pub(crate) struct Shared {
    state: Mutex<EngineState>,
    /// Signalled on every tick
    pub(crate) data_ready: Condvar,
    /// Signalled only on ticks that raised an alert
    pub(crate) priority_event: Condvar,
    /// Wakes the ticker when its schedule changes
    pub(crate) ticker_wake: Condvar,
}

impl Shared {
    /// Take the state lock
    ///
    /// A panic on another thread cannot leave the state half-updated in a
    /// way that matters here, so a poisoned lock is simply recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the lock and sleep on `condvar`, re-locking on wake-up
    pub(crate) fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, EngineState>,
    ) -> MutexGuard<'a, EngineState> {
        condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Same as [`Shared::wait`] with an upper bound on the sleep
    pub(crate) fn wait_timeout<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, EngineState>,
        timeout: Duration,
    ) -> MutexGuard<'a, EngineState> {
        match condvar.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }

    /// Wake waiters after a tick; the lock must already be released
    pub(crate) fn notify(&self, outcome: &TickOutcome) {
        self.data_ready.notify_all();
        if outcome.alert {
            self.priority_event.notify_all();
        }
    }

    /// Wake every waiter regardless of channel
    pub(crate) fn wake_all(&self) {
        self.data_ready.notify_all();
        self.priority_event.notify_all();
        self.ticker_wake.notify_all();
    }
}

/// Handle to the simulated sensor
///
/// Cheap to clone; every clone refers to the same state. The ticker, the
/// control plane and readers all hold one.
///
/// ## Example
///
/// ```rust
/// use simtemp_core::{Engine, Mode};
///
/// let engine = Engine::builder().seed(1).build().unwrap();
/// engine.set_mode(Mode::Ramp);
///
/// let outcome = engine.tick();
/// assert_eq!(outcome.sample.temperature_mc, 26_000);
/// assert_eq!(engine.stats().samples_produced, 1);
/// ```
#[derive(Clone)]
pub struct Engine {
    pub(crate) shared: Arc<Shared>,
}

impl Engine {
    /// Engine with default settings and optional start-up overrides
    pub fn new(initial: InitialConfig) -> SimTempResult<Self> {
        EngineBuilder::new().initial(initial).build()
    }

    /// Start configuring an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Generate one sample now
    ///
    /// This is what the ticker calls each period. It is public so that
    /// callers without a ticker can drive the engine step by step.
    pub fn tick(&self) -> TickOutcome {
        let outcome = self.shared.lock().tick();
        self.shared.notify(&outcome);
        outcome
    }

    /// Non-consuming readiness snapshot
    ///
    /// `priority` reflects the threshold-crossed latch: set by any alert,
    /// cleared by [`Engine::set_threshold`].
    pub fn readiness(&self) -> Readiness {
        let state = self.shared.lock();
        Readiness {
            readable: !state.queue.is_empty(),
            priority: state.threshold_crossed,
        }
    }

    /// Number of samples waiting to be read
    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Current ramp state
    pub fn ramp_state(&self) -> RampState {
        self.shared.lock().ramp
    }

    /// Temperature stored by the last tick
    pub fn current_temperature_mc(&self) -> i32 {
        self.shared.lock().current_temperature_mc
    }

    /// Tear down: blocked readers return `Interrupted`, queued samples drop
    pub fn close(&self) {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.schedule.active = false;
            state.queue.clear();
        }
        self.shared.wake_all();
        info!("engine closed");
    }

    /// Whether [`Engine::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

/// Builder for [`Engine`]
///
/// Tests use it to pin the random seed and the clock.
pub struct EngineBuilder {
    initial: InitialConfig,
    mode: Mode,
    seed: Option<u64>,
    clock: Option<Box<dyn ClockSource>>,
}

impl EngineBuilder {
    /// Builder with all defaults
    pub fn new() -> Self {
        Self {
            initial: InitialConfig::default(),
            mode: Mode::Normal,
            seed: None,
            clock: None,
        }
    }

    /// Apply externally loaded start-up values
    pub fn initial(mut self, initial: InitialConfig) -> Self {
        self.initial = initial;
        self
    }

    /// Start in `mode` instead of `Normal`
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed the noise generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use a custom timestamp source
    pub fn clock<C: ClockSource + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate and create the engine
    pub fn build(self) -> SimTempResult<Engine> {
        let mut config = self.initial.resolve()?;
        config.mode = self.mode;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        info!(
            "engine created: sampling {} ms, threshold {} mC, mode {}",
            config.sampling_period_ms, config.threshold_mc, config.mode
        );

        let state = EngineState {
            config,
            ramp: RampState::start(),
            current_temperature_mc: INITIAL_TEMPERATURE_MC,
            queue: SampleQueue::new(),
            stats: Statistics::default(),
            threshold_crossed: false,
            alert_seq: 0,
            alert_floor: 0,
            schedule: Schedule {
                active: false,
                next_tick: Instant::now() + config.sampling_period(),
            },
            closed: false,
            rng,
            clock,
        };

        Ok(Engine {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                data_ready: Condvar::new(),
                priority_event: Condvar::new(),
                ticker_wake: Condvar::new(),
            }),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
