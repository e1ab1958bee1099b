//! Device Surfaces for the Simulated Temperature Sensor
//!
//! ## Overview
//!
//! `simtemp-core` knows nothing about files, attributes or request numbers.
//! This crate wraps an engine in the shapes a character device gives its
//! users, so tools written against the real node can be pointed at the
//! simulator instead.
//!
//! | Surface | Module | Shape |
//! |---------|--------|-------|
//! | Endpoint | [`node`] | `open` → `read` 16-byte records, `poll` for data / alerts |
//! | Attributes | [`attributes`] | named text values, one per file |
//! | Commands | [`ioctl`] | fixed-size little-endian request/response |
//! | Start-up config | [`loader`] | JSON property document |
//! | Async | `async_source` | `tokio` wrapper around a blocking endpoint |
//!
//! All surfaces validate before touching the engine, so a rejected value
//! never partially applies.
//!
//! ## Example Usage
//!
//! ```no_run
//! use simtemp_device::{node::OpenFlags, SimTempDevice};
//! use simtemp_core::InitialConfig;
//!
//! let device = SimTempDevice::probe(InitialConfig::default())?;
//! device.attributes().store("mode", "ramp\n")?;
//!
//! let file = device.open(OpenFlags::default());
//! let mut record = [0u8; 16];
//! let n = file.read(&mut record)?;
//! assert_eq!(n, 16);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io;

use simtemp_core::SimTempError;
use thiserror::Error;

pub mod attributes;
pub mod ioctl;
pub mod loader;
pub mod node;

#[cfg(feature = "async")]
pub mod async_source;

// Re-export common types
pub use attributes::{Attribute, Attributes};
pub use ioctl::{Command, StatsReply};
pub use node::{DeviceFile, OpenFlags, PollMask, SimTempDevice};

#[cfg(feature = "async")]
pub use async_source::{AsyncDeviceReader, AsyncSampleSource};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Common device errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Engine(#[from] SimTempError),

    #[error("Bad address: argument needs {needed} bytes, got {got}")]
    Fault { needed: usize, got: usize },

    #[error("Inappropriate ioctl for device: {0:#010x}")]
    NotTty(u32),

    #[error("No such attribute: {0}")]
    NoSuchAttribute(String),

    #[error("Attribute is read-only: {0}")]
    ReadOnly(&'static str),

    #[error("Cannot parse {what} from {input:?}")]
    Parse { what: &'static str, input: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DeviceError {
    /// Errno-style code, as a C caller of the real node would see it
    pub fn code(&self) -> i32 {
        match self {
            Self::Engine(e) => e.errno(),
            Self::Fault { .. } => 14,          // EFAULT
            Self::NotTty(_) => 25,             // ENOTTY
            Self::NoSuchAttribute(_) => 2,     // ENOENT
            Self::ReadOnly(_) => 13,           // EACCES
            Self::Parse { .. } | Self::Config(_) => 22,
            Self::Io(e) => e.raw_os_error().unwrap_or(5),
        }
    }

    /// Closest `std::io` classification
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Engine(SimTempError::WouldBlock) => io::ErrorKind::WouldBlock,
            Self::Engine(SimTempError::Interrupted) => io::ErrorKind::Interrupted,
            Self::Engine(_) | Self::Fault { .. } => io::ErrorKind::InvalidInput,
            Self::NotTty(_) => io::ErrorKind::Unsupported,
            Self::NoSuchAttribute(_) => io::ErrorKind::NotFound,
            Self::ReadOnly(_) => io::ErrorKind::PermissionDenied,
            Self::Parse { .. } | Self::Config(_) => io::ErrorKind::InvalidData,
            Self::Io(e) => e.kind(),
        }
    }
}

impl From<DeviceError> for io::Error {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Io(e) => e,
            other => io::Error::new(other.kind(), other),
        }
    }
}
