//! Device endpoint
//!
//! [`SimTempDevice`] is the probed device: it owns the engine and its
//! ticker for as long as it lives. Consumers `open` it to get a
//! [`DeviceFile`], which behaves like a file descriptor on the node:
//!
//! - `read` returns exactly one 16-byte record, never a partial or a batch
//! - a buffer shorter than one record fails with `InvalidArgument`
//! - `poll` reports `POLLIN | POLLRDNORM` for queued data and `POLLPRI` for
//!   an alert this file has not seen yet

use std::fmt;
use std::io;
use std::ops::{BitAnd, BitOr};
use std::time::Duration;

use log::info;
use simtemp_core::{
    record, Engine, InitialConfig, Interest, Interrupter, ReadMode, Reader, Readiness, Sample,
    SimTempError, Ticker, RECORD_SIZE,
};

use crate::attributes::Attributes;
use crate::DeviceResult;

/// Flags given to [`SimTempDevice::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Reads on an empty queue fail with `WouldBlock` instead of sleeping
    pub nonblocking: bool,
}

impl OpenFlags {
    /// `O_NONBLOCK`
    pub const NONBLOCK: Self = Self { nonblocking: true };
}

/// Poll event bits, Linux values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PollMask(u16);

impl PollMask {
    /// Data can be read
    pub const POLLIN: Self = Self(0x0001);
    /// Urgent event: a threshold alert
    pub const POLLPRI: Self = Self(0x0002);
    /// Normal data can be read
    pub const POLLRDNORM: Self = Self(0x0040);

    /// No events
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// True if no bit is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    fn interest(&self) -> Interest {
        Interest {
            readable: self.intersects(Self::POLLIN | Self::POLLRDNORM),
            priority: self.contains(Self::POLLPRI),
        }
    }
}

impl BitOr for PollMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for PollMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<Readiness> for PollMask {
    fn from(readiness: Readiness) -> Self {
        let mut mask = Self::empty();
        if readiness.readable {
            mask = mask | Self::POLLIN | Self::POLLRDNORM;
        }
        if readiness.priority {
            mask = mask | Self::POLLPRI;
        }
        mask
    }
}

impl fmt::Display for PollMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::POLLIN, "POLLIN"),
            (Self::POLLPRI, "POLLPRI"),
            (Self::POLLRDNORM, "POLLRDNORM"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            f.write_str("0")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// A probed simulator instance
///
/// Owns the engine and keeps it ticking until removed or dropped.
pub struct SimTempDevice {
    engine: Engine,
    ticker: Option<Ticker>,
}

impl SimTempDevice {
    /// Create the engine from `initial` and start sampling
    pub fn probe(initial: InitialConfig) -> DeviceResult<Self> {
        Self::with_engine(Engine::new(initial)?)
    }

    /// Start sampling on an engine built elsewhere
    pub fn with_engine(engine: Engine) -> DeviceResult<Self> {
        let ticker = Ticker::start(&engine)?;
        let config = engine.config();
        info!(
            "simtemp device probed (sampling {} ms, threshold {} mC)",
            config.sampling_period_ms, config.threshold_mc
        );
        Ok(Self {
            engine,
            ticker: Some(ticker),
        })
    }

    /// The engine behind this device
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Open a new file on the node
    pub fn open(&self, flags: OpenFlags) -> DeviceFile {
        DeviceFile {
            reader: self.engine.reader(),
            flags,
        }
    }

    /// Text attribute surface
    pub fn attributes(&self) -> Attributes<'_> {
        Attributes::new(&self.engine)
    }

    /// Stop sampling and release blocked readers
    pub fn remove(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(mut ticker) = self.ticker.take() else {
            return;
        };
        ticker.stop();
        self.engine.close();
        info!("simtemp device removed");
    }
}

impl Drop for SimTempDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One open file on the device node
pub struct DeviceFile {
    reader: Reader,
    flags: OpenFlags,
}

impl DeviceFile {
    /// Flags the file was opened with
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Switch between blocking and non-blocking reads
    pub fn set_nonblocking(&mut self, nonblocking: bool) {
        self.flags.nonblocking = nonblocking;
    }

    /// Engine behind this file
    pub fn engine(&self) -> &Engine {
        self.reader.engine()
    }

    /// Handle that cancels this file's blocking calls
    pub fn interrupter(&self) -> Interrupter {
        self.reader.interrupter()
    }

    fn mode(&self) -> ReadMode {
        if self.flags.nonblocking {
            ReadMode::NonBlocking
        } else {
            ReadMode::Blocking
        }
    }

    /// Read one serialized sample into `buf`
    ///
    /// Returns 16 on success. Bytes of `buf` past the first record are left
    /// untouched.
    pub fn read(&self, buf: &mut [u8]) -> DeviceResult<usize> {
        if buf.len() < RECORD_SIZE {
            return Err(SimTempError::InvalidArgument {
                what: "read length",
                value: buf.len() as i64,
            }
            .into());
        }
        let sample = self.reader.read(self.mode())?;
        Ok(record::encode_into(&sample, buf)?)
    }

    /// Read one sample without serializing it
    pub fn read_sample(&self) -> DeviceResult<Sample> {
        Ok(self.reader.read(self.mode())?)
    }

    /// Current events; reports each alert once per file
    pub fn poll(&self) -> PollMask {
        self.reader.poll_readiness().into()
    }

    /// Sleep until an event in `interest` is ready or `timeout` passes
    ///
    /// Only `POLLPRI` in `interest` means ordinary ticks do not wake the
    /// caller. Returns the ready events within `interest`, empty on timeout.
    pub fn poll_wait(&self, interest: PollMask, timeout: Option<Duration>) -> DeviceResult<PollMask> {
        let readiness = self.reader.wait_ready(interest.interest(), timeout)?;
        Ok(PollMask::from(readiness) & interest)
    }
}

impl io::Read for DeviceFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        DeviceFile::read(self, buf).map_err(io::Error::from)
    }
}
