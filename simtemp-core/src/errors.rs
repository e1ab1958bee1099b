//! Error Types for the Simulated Sensor Engine
//!
//! ## Design Philosophy
//!
//! Every error the engine can report to a caller is small and `Copy`:
//!
//! 1. **No Heap Allocation**: Messages are `&'static str`, so errors can be
//!    returned from the reader hot path without allocating.
//!
//! 2. **Rejected Before Mutation**: `InvalidArgument` is produced while
//!    validating input, before the engine lock is taken. A failed control
//!    call never leaves a partially applied configuration behind.
//!
//! 3. **Recoverable**: Nothing here is fatal to the engine. `WouldBlock` and
//!    `Interrupted` just mean "try again" with different urgency.
//!
//! ## Error Categories
//!
//! ### Control Plane
//! - `InvalidArgument`: sampling period outside `[10, 10000]` ms, unknown mode
//!
//! ### Reader Interface
//! - `WouldBlock`: non-blocking read against an empty queue
//! - `Interrupted`: a blocking read was cancelled through its interrupter
//! - `ShortBuffer`: destination too small for one serialized sample
//!
//! Queue overflow is deliberately absent. It happens on the ticker thread,
//! where there is no caller to hand an error to, so it only shows up in
//! [`Statistics`](crate::stats::Statistics).
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use simtemp_core::{Engine, SimTempError};
//!
//! fn drain(engine: &Engine) {
//!     let reader = engine.reader();
//!     loop {
//!         match reader.try_read() {
//!             Ok(sample) => println!("{} mC", sample.temperature_mc),
//!             Err(nb::Error::WouldBlock) => break,
//!             Err(nb::Error::Other(SimTempError::Interrupted)) => break,
//!             Err(nb::Error::Other(e)) => panic!("unexpected: {e}"),
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for engine operations
pub type SimTempResult<T> = Result<T, SimTempError>;

/// Errors surfaced by the engine's reader and control paths
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTempError {
    /// Out-of-range or unrecognized configuration value
    #[error("Invalid {what}: {value}")]
    InvalidArgument {
        /// Name of the rejected parameter
        what: &'static str,
        /// The rejected value, widened for display
        value: i64,
    },

    /// Non-blocking read attempted on an empty queue
    #[error("Operation would block")]
    WouldBlock,

    /// Blocking wait was cancelled before a sample arrived
    #[error("Interrupted while waiting for data")]
    Interrupted,

    /// Destination buffer cannot hold a whole record
    #[error("Buffer too small: need {needed} bytes, have {got}")]
    ShortBuffer {
        /// Bytes required for one record
        needed: usize,
        /// Bytes actually provided
        got: usize,
    },
}

impl SimTempError {
    /// Errno-style code, as reported by the device surfaces
    pub const fn errno(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::ShortBuffer { .. } => 22, // EINVAL
            Self::WouldBlock => 11,                                        // EAGAIN
            Self::Interrupted => 4,                                        // EINTR
        }
    }

    /// True for errors where retrying the same call later can succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::Interrupted)
    }
}
