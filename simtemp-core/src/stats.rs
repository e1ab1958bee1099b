//! Engine activity counters
//!
//! All counters only ever go up, and only the tick path writes them.
//! Readers receive copies taken under the engine lock.

use serde::{Deserialize, Serialize};

/// Codes recorded in [`Statistics::last_error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    /// Nothing has gone wrong yet
    None = 0,
    /// A generated sample was dropped because the queue was full
    QueueOverflow = 28, // ENOSPC
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Samples accepted into the queue
    pub samples_produced: u32,
    /// Ticks that raised a threshold alert
    pub alerts_triggered: u32,
    /// Samples dropped because the queue was full
    pub queue_overflow_errors: u32,
    /// Code of the most recent internal error, see [`ErrorCode`]
    pub last_error: u32,
}

impl Statistics {
    pub(crate) fn record_produced(&mut self) {
        self.samples_produced = self.samples_produced.wrapping_add(1);
    }

    pub(crate) fn record_alert(&mut self) {
        self.alerts_triggered = self.alerts_triggered.wrapping_add(1);
    }

    pub(crate) fn record_overflow(&mut self) {
        self.queue_overflow_errors = self.queue_overflow_errors.wrapping_add(1);
        self.last_error = ErrorCode::QueueOverflow as u32;
    }

    /// Total samples generated, including dropped ones
    pub fn samples_generated(&self) -> u64 {
        u64::from(self.samples_produced) + u64::from(self.queue_overflow_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_sets_last_error() {
        let mut stats = Statistics::default();
        assert_eq!(stats.last_error, ErrorCode::None as u32);

        stats.record_produced();
        stats.record_overflow();
        stats.record_overflow();

        assert_eq!(stats.samples_produced, 1);
        assert_eq!(stats.queue_overflow_errors, 2);
        assert_eq!(stats.last_error, 28);
        assert_eq!(stats.samples_generated(), 3);
    }
}
