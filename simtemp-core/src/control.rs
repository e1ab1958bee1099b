//! Control plane
//!
//! Configuration changes and snapshots. Values are validated before the
//! lock is taken, so a rejected call leaves the configuration untouched.

use std::time::Instant;

use log::{info, warn};

use crate::config::{check_sampling_period, Configuration};
use crate::engine::Engine;
use crate::errors::SimTempResult;
use crate::signal::{Mode, RampState};
use crate::stats::Statistics;

impl Engine {
    /// Change the sampling period
    ///
    /// The next tick is rescheduled to `now + ms` immediately instead of
    /// waiting out the period that was in effect.
    pub fn set_sampling_period(&self, ms: u32) -> SimTempResult<()> {
        let ms = check_sampling_period(ms).map_err(|e| {
            warn!("rejected sampling period {} ms", ms);
            e
        })?;

        {
            let mut state = self.shared.lock();
            state.config.sampling_period_ms = ms;
            state.schedule.next_tick = Instant::now() + state.config.sampling_period();
        }
        self.shared.ticker_wake.notify_all();

        info!("sampling period set to {} ms", ms);
        Ok(())
    }

    /// Change the alert threshold
    ///
    /// Any signed value is accepted. The threshold-crossed latch is reset and
    /// alerts raised before the change are no longer reported as pending.
    pub fn set_threshold(&self, threshold_mc: i32) {
        {
            let mut state = self.shared.lock();
            state.config.threshold_mc = threshold_mc;
            state.threshold_crossed = false;
            state.alert_floor = state.alert_seq;
        }
        info!("threshold set to {} mC", threshold_mc);
    }

    /// Select the signal model
    ///
    /// Selecting `Ramp` always restarts the ramp, even if it is already the
    /// active mode.
    pub fn set_mode(&self, mode: Mode) {
        {
            let mut state = self.shared.lock();
            state.config.mode = mode;
            if mode == Mode::Ramp {
                state.ramp = RampState::start();
            }
        }
        info!("mode set to {}", mode);
    }

    /// Select the signal model from its numeric value
    ///
    /// Fails with `InvalidArgument` for values other than 0, 1 or 2.
    pub fn set_mode_raw(&self, raw: u32) -> SimTempResult<()> {
        let mode = Mode::try_from(raw).map_err(|e| {
            warn!("rejected mode value {}", raw);
            e
        })?;
        self.set_mode(mode);
        Ok(())
    }

    /// Consistent copy of the configuration
    pub fn config(&self) -> Configuration {
        self.shared.lock().config
    }

    /// Consistent copy of the counters
    pub fn stats(&self) -> Statistics {
        self.shared.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SimTempError;

    fn engine() -> Engine {
        Engine::builder().seed(11).build().unwrap()
    }

    #[test]
    fn sampling_period_round_trip() {
        let engine = engine();
        engine.set_sampling_period(250).unwrap();
        assert_eq!(engine.config().sampling_period_ms, 250);
    }

    #[test]
    fn rejected_period_leaves_config() {
        let engine = engine();
        let before = engine.config();

        assert_eq!(
            engine.set_sampling_period(9),
            Err(SimTempError::InvalidArgument { what: "sampling period", value: 9 })
        );
        assert!(engine.set_sampling_period(10_001).is_err());
        assert_eq!(engine.config(), before);
    }

    #[test]
    fn threshold_accepts_any_value() {
        let engine = engine();
        for value in [i32::MIN, -1, 0, 41_000, i32::MAX] {
            engine.set_threshold(value);
            assert_eq!(engine.config().threshold_mc, value);
        }
    }

    #[test]
    fn threshold_change_clears_latch() {
        let engine = Engine::builder().mode(Mode::Ramp).seed(1).build().unwrap();
        engine.set_threshold(0);
        engine.tick();
        assert!(engine.readiness().priority);

        engine.set_threshold(0);
        assert!(!engine.readiness().priority);
    }

    #[test]
    fn reselecting_ramp_resets_it() {
        let engine = engine();
        engine.set_mode(Mode::Ramp);
        for _ in 0..50 {
            engine.tick();
        }
        // 25000 + 35 steps up to 60000, then 15 steps down
        assert_eq!(engine.ramp_state(), RampState { base_mc: 45_000, rising: false });

        engine.set_mode(Mode::Ramp);
        assert_eq!(engine.ramp_state(), RampState::start());
        assert_eq!(engine.tick().sample.temperature_mc, 26_000);
    }

    #[test]
    fn raw_mode_validation() {
        let engine = engine();
        assert!(engine.set_mode_raw(2).is_ok());
        assert_eq!(engine.config().mode, Mode::Ramp);

        assert!(engine.set_mode_raw(3).is_err());
        assert_eq!(engine.config().mode, Mode::Ramp);
    }
}
