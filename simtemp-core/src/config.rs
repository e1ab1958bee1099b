//! Engine configuration
//!
//! The live [`Configuration`] is only changed through the control plane.
//! [`InitialConfig`] is what an external loader may supply when the engine
//! is created; anything it leaves out falls back to the defaults below.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{SimTempError, SimTempResult};
use crate::signal::Mode;

/// Shortest accepted sampling period
pub const MIN_SAMPLING_MS: u32 = 10;

/// Longest accepted sampling period
pub const MAX_SAMPLING_MS: u32 = 10_000;

/// Sampling period used when none is supplied
pub const DEFAULT_SAMPLING_MS: u32 = 50;

/// Alert threshold used when none is supplied
pub const DEFAULT_THRESHOLD_MC: i32 = 41_000;

/// Stored temperature before the first tick
pub const INITIAL_TEMPERATURE_MC: i32 = 40_000;

/// Reject sampling periods outside `[MIN_SAMPLING_MS, MAX_SAMPLING_MS]`
pub fn check_sampling_period(ms: u32) -> SimTempResult<u32> {
    if (MIN_SAMPLING_MS..=MAX_SAMPLING_MS).contains(&ms) {
        Ok(ms)
    } else {
        Err(SimTempError::InvalidArgument {
            what: "sampling period",
            value: i64::from(ms),
        })
    }
}

/// Live engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Time between ticks, in `[10, 10000]` ms
    pub sampling_period_ms: u32,
    /// Alert threshold in mC
    pub threshold_mc: i32,
    /// Active signal model
    pub mode: Mode,
}

impl Configuration {
    /// Sampling period as a `Duration`
    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampling_period_ms))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            sampling_period_ms: DEFAULT_SAMPLING_MS,
            threshold_mc: DEFAULT_THRESHOLD_MC,
            mode: Mode::Normal,
        }
    }
}

/// Externally supplied start-up values
///
/// Field names follow the property names of the device description this
/// engine historically read (`sampling-ms`, `threshold-mC`). Other keys are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitialConfig {
    /// Sampling period override
    #[serde(rename = "sampling-ms", default, skip_serializing_if = "Option::is_none")]
    pub sampling_ms: Option<u32>,
    /// Threshold override
    #[serde(rename = "threshold-mC", default, skip_serializing_if = "Option::is_none")]
    pub threshold_mc: Option<i32>,
}

impl InitialConfig {
    /// Set the sampling period
    pub fn with_sampling_ms(mut self, ms: u32) -> Self {
        self.sampling_ms = Some(ms);
        self
    }

    /// Set the threshold
    pub fn with_threshold_mc(mut self, mc: i32) -> Self {
        self.threshold_mc = Some(mc);
        self
    }

    /// Merge with defaults, validating the sampling period
    pub fn resolve(&self) -> SimTempResult<Configuration> {
        let defaults = Configuration::default();
        let sampling_period_ms = match self.sampling_ms {
            Some(ms) => check_sampling_period(ms)?,
            None => defaults.sampling_period_ms,
        };

        Ok(Configuration {
            sampling_period_ms,
            threshold_mc: self.threshold_mc.unwrap_or(defaults.threshold_mc),
            mode: defaults.mode,
        })
    }
}
