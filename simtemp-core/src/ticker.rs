//! Periodic sample generation
//!
//! The ticker is a background thread that sleeps until the next tick is due,
//! runs one tick, notifies waiters and reschedules itself with whatever
//! sampling period is configured at that moment.
//!
//! ```text
//! loop:
//!   lock
//!   while now < next_tick: wait(ticker_wake, next_tick - now)
//!   tick()                          (lock held)
//!   unlock → notify data_ready / priority_event
//!   lock → next_tick = now + period → unlock
//! ```
//!
//! The deadline lives in the engine state, so a control-plane period change
//! just moves it and pokes `ticker_wake`; there is no timer object to
//! cancel. Scheduling is reschedule-after-tick, so drift accumulates by the
//! tick's own execution time.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info};

use crate::engine::{Engine, Shared};

/// Handle to the running ticker thread
///
/// Dropping it stops the thread and waits for it to exit.
pub struct Ticker {
    engine: Engine,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking `engine`
    ///
    /// The first tick is due one sampling period from now. Fails with
    /// `AlreadyExists` if a ticker is already attached to the engine.
    pub fn start(engine: &Engine) -> io::Result<Self> {
        {
            let mut state = engine.shared.lock();
            if state.closed {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "engine is closed"));
            }
            if state.schedule.active {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "ticker already running"));
            }
            state.schedule.active = true;
            state.schedule.next_tick = Instant::now() + state.config.sampling_period();
        }

        let shared = Arc::clone(&engine.shared);
        let spawned = thread::Builder::new()
            .name("simtemp-ticker".into())
            .spawn(move || run(shared));

        match spawned {
            Ok(handle) => {
                info!("ticker started");
                Ok(Self {
                    engine: engine.clone(),
                    handle: Some(handle),
                })
            }
            Err(e) => {
                engine.shared.lock().schedule.active = false;
                Err(e)
            }
        }
    }

    /// Check if the thread is still attached
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop ticking and join the thread
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.engine.shared.lock().schedule.active = false;
        self.engine.shared.ticker_wake.notify_all();

        if handle.join().is_err() {
            debug!("ticker thread panicked");
        }
        info!("ticker stopped");
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticker thread body
fn run(shared: Arc<Shared>) {
    let mut state = shared.lock();

    while state.schedule.active {
        let now = Instant::now();
        if now < state.schedule.next_tick {
            let remaining = state.schedule.next_tick - now;
            state = shared.wait_timeout(&shared.ticker_wake, state, remaining);
            continue;
        }

        let outcome = state.tick();
        drop(state);
        shared.notify(&outcome);

        state = shared.lock();
        state.schedule.next_tick = Instant::now() + state.config.sampling_period();
    }
}
