//! Simulated temperature sensor engine
//!
//! Periodically synthesizes timestamped temperature readings from one of
//! three signal models, buffers them in a bounded queue, flags sustained
//! threshold alerts and exposes a small control plane.
//!
//! Key properties:
//! - One engine instance, one state lock, two notification channels
//! - Lossy under pressure: a full queue drops the newest sample
//! - Blocking reads are cancellable and never hold the lock while asleep
//!
//! ```no_run
//! use simtemp_core::{Engine, InitialConfig, ReadMode, Ticker};
//!
//! let engine = Engine::new(InitialConfig::default().with_sampling_ms(100))?;
//! let _ticker = Ticker::start(&engine)?;
//!
//! let reader = engine.reader();
//! let sample = reader.read(ReadMode::Blocking)?;
//! println!("{} °C", sample.celsius());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod queue;
pub mod reader;
pub mod record;
pub mod sample;
pub mod signal;
pub mod stats;
pub mod ticker;
pub mod time;
pub mod traits;

// Public API
pub use config::{Configuration, InitialConfig};
pub use engine::{alert_raised, Engine, EngineBuilder, Readiness, TickOutcome};
pub use errors::{SimTempError, SimTempResult};
pub use queue::{SampleQueue, QUEUE_CAPACITY};
pub use reader::{Interest, Interrupter, ReadMode, Reader};
pub use record::RECORD_SIZE;
pub use sample::{Sample, SampleFlags};
pub use signal::{Mode, RampState};
pub use stats::Statistics;
pub use ticker::Ticker;
pub use time::{ClockSource, ManualClock, MonotonicClock};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
