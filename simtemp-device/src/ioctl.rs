//! Binary command surface
//!
//! Request numbers are built the way Linux `_IOW`/`_IOR` build them:
//!
//! ```text
//!  31 30 29        16 15      8 7       0
//! ┌─────┬────────────┬─────────┬─────────┐
//! │ dir │    size    │  magic  │   nr    │
//! └─────┴────────────┴─────────┴─────────┘
//! ```
//!
//! Arguments travel as fixed-size little-endian byte buffers. The handler
//! copies the argument in before validating it, so a buffer that is too
//! short fails with `Fault` before anything else is looked at.

use log::warn;
use simtemp_core::{Engine, Statistics};

use crate::node::DeviceFile;
use crate::{DeviceError, DeviceResult};

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

/// Userspace writes, driver reads
pub const IOC_WRITE: u32 = 1;
/// Driver writes, userspace reads
pub const IOC_READ: u32 = 2;

/// Magic byte shared by all simtemp requests
pub const SIMTEMP_IOC_MAGIC: u8 = b'S';

const fn ioc(dir: u32, ty: u8, nr: u8, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// `_IOW(ty, nr, size)`
pub const fn iow(ty: u8, nr: u8, size: usize) -> u32 {
    ioc(IOC_WRITE, ty, nr, size)
}

/// `_IOR(ty, nr, size)`
pub const fn ior(ty: u8, nr: u8, size: usize) -> u32 {
    ioc(IOC_READ, ty, nr, size)
}

/// Size of the [`StatsReply`] wire form
pub const STATS_REPLY_SIZE: usize = 16;

/// Set the sampling period (u32 ms)
pub const SIMTEMP_SET_SAMPLING: u32 = iow(SIMTEMP_IOC_MAGIC, 1, 4);
/// Set the threshold (i32 mC)
pub const SIMTEMP_SET_THRESHOLD: u32 = iow(SIMTEMP_IOC_MAGIC, 2, 4);
/// Set the mode (u32, 0..=2)
pub const SIMTEMP_SET_MODE: u32 = iow(SIMTEMP_IOC_MAGIC, 3, 4);
/// Read the counters (4 × u32)
pub const SIMTEMP_GET_STATS: u32 = ior(SIMTEMP_IOC_MAGIC, 4, STATS_REPLY_SIZE);

/// Counters as returned by `GET_STATS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsReply {
    pub samples_produced: u32,
    pub alerts_triggered: u32,
    pub queue_overflow_errors: u32,
    pub last_error: u32,
}

impl StatsReply {
    /// Little-endian wire form
    pub fn to_bytes(&self) -> [u8; STATS_REPLY_SIZE] {
        let mut out = [0u8; STATS_REPLY_SIZE];
        let fields = [
            self.samples_produced,
            self.alerts_triggered,
            self.queue_overflow_errors,
            self.last_error,
        ];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        out
    }

    /// Parse the wire form
    pub fn from_bytes(bytes: &[u8]) -> DeviceResult<Self> {
        let bytes = bytes.get(..STATS_REPLY_SIZE).ok_or(DeviceError::Fault {
            needed: STATS_REPLY_SIZE,
            got: bytes.len(),
        })?;
        let field = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self {
            samples_produced: field(0),
            alerts_triggered: field(4),
            queue_overflow_errors: field(8),
            last_error: field(12),
        })
    }
}

impl From<Statistics> for StatsReply {
    fn from(stats: Statistics) -> Self {
        Self {
            samples_produced: stats.samples_produced,
            alerts_triggered: stats.alerts_triggered,
            queue_overflow_errors: stats.queue_overflow_errors,
            last_error: stats.last_error,
        }
    }
}

/// Decoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetSampling(u32),
    SetThreshold(i32),
    /// Raw value; range-checked when executed
    SetMode(u32),
    GetStats,
}

fn arg4(arg: &[u8]) -> DeviceResult<[u8; 4]> {
    arg.get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DeviceError::Fault {
            needed: 4,
            got: arg.len(),
        })
}

impl Command {
    /// Request number for this command
    pub const fn request(&self) -> u32 {
        match self {
            Command::SetSampling(_) => SIMTEMP_SET_SAMPLING,
            Command::SetThreshold(_) => SIMTEMP_SET_THRESHOLD,
            Command::SetMode(_) => SIMTEMP_SET_MODE,
            Command::GetStats => SIMTEMP_GET_STATS,
        }
    }

    /// Decode a request number and its argument buffer
    pub fn decode(request: u32, arg: &[u8]) -> DeviceResult<Self> {
        match request {
            SIMTEMP_SET_SAMPLING => Ok(Command::SetSampling(u32::from_le_bytes(arg4(arg)?))),
            SIMTEMP_SET_THRESHOLD => Ok(Command::SetThreshold(i32::from_le_bytes(arg4(arg)?))),
            SIMTEMP_SET_MODE => Ok(Command::SetMode(u32::from_le_bytes(arg4(arg)?))),
            SIMTEMP_GET_STATS => {
                if arg.len() < STATS_REPLY_SIZE {
                    return Err(DeviceError::Fault {
                        needed: STATS_REPLY_SIZE,
                        got: arg.len(),
                    });
                }
                Ok(Command::GetStats)
            }
            other => {
                warn!("unknown request {:#010x}", other);
                Err(DeviceError::NotTty(other))
            }
        }
    }

    /// Argument bytes a caller passes with this command
    pub fn encode_arg(&self) -> [u8; STATS_REPLY_SIZE] {
        let mut arg = [0u8; STATS_REPLY_SIZE];
        match self {
            Command::SetSampling(ms) => arg[..4].copy_from_slice(&ms.to_le_bytes()),
            Command::SetThreshold(mc) => arg[..4].copy_from_slice(&mc.to_le_bytes()),
            Command::SetMode(raw) => arg[..4].copy_from_slice(&raw.to_le_bytes()),
            Command::GetStats => {}
        }
        arg
    }

    /// Apply the command to `engine`
    ///
    /// Returns the counters for `GetStats`, `None` otherwise.
    pub fn execute(&self, engine: &Engine) -> DeviceResult<Option<StatsReply>> {
        match *self {
            Command::SetSampling(ms) => engine.set_sampling_period(ms)?,
            Command::SetThreshold(mc) => engine.set_threshold(mc),
            Command::SetMode(raw) => engine.set_mode_raw(raw)?,
            Command::GetStats => return Ok(Some(engine.stats().into())),
        }
        Ok(None)
    }
}

/// Handle one request against `engine`
///
/// For `GET_STATS` the counters are written to the front of `arg`.
pub fn ioctl(engine: &Engine, request: u32, arg: &mut [u8]) -> DeviceResult<()> {
    let command = Command::decode(request, arg)?;
    if let Some(reply) = command.execute(engine)? {
        arg[..STATS_REPLY_SIZE].copy_from_slice(&reply.to_bytes());
    }
    Ok(())
}

impl DeviceFile {
    /// Raw request on this file
    pub fn ioctl(&self, request: u32, arg: &mut [u8]) -> DeviceResult<()> {
        ioctl(self.engine(), request, arg)
    }

    /// Typed request; round-trips through the wire encoding
    pub fn command(&self, command: Command) -> DeviceResult<Option<StatsReply>> {
        let mut arg = command.encode_arg();
        self.ioctl(command.request(), &mut arg)?;
        match command {
            Command::GetStats => Ok(Some(StatsReply::from_bytes(&arg)?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simtemp_core::{Mode, SimTempError};

    fn engine() -> Engine {
        Engine::builder().seed(4).build().unwrap()
    }

    #[test]
    fn request_numbers_match_linux_macros() {
        // Values produced by the C headers on Linux
        assert_eq!(SIMTEMP_SET_SAMPLING, 0x4004_5301);
        assert_eq!(SIMTEMP_SET_THRESHOLD, 0x4004_5302);
        assert_eq!(SIMTEMP_SET_MODE, 0x4004_5303);
        assert_eq!(SIMTEMP_GET_STATS, 0x8010_5304);
    }

    #[test]
    fn set_sampling() {
        let engine = engine();
        let mut arg = 250u32.to_le_bytes();
        ioctl(&engine, SIMTEMP_SET_SAMPLING, &mut arg).unwrap();
        assert_eq!(engine.config().sampling_period_ms, 250);

        let mut arg = 5u32.to_le_bytes();
        let err = ioctl(&engine, SIMTEMP_SET_SAMPLING, &mut arg).unwrap_err();
        assert!(matches!(err, DeviceError::Engine(SimTempError::InvalidArgument { .. })));
        assert_eq!(engine.config().sampling_period_ms, 250);
    }

    #[test]
    fn short_argument_faults() {
        let engine = engine();
        let mut arg = [0u8; 2];
        let err = ioctl(&engine, SIMTEMP_SET_THRESHOLD, &mut arg).unwrap_err();
        assert_eq!(err.code(), 14);

        let mut arg = [0u8; 8];
        assert!(matches!(
            ioctl(&engine, SIMTEMP_GET_STATS, &mut arg),
            Err(DeviceError::Fault { needed: 16, got: 8 })
        ));
    }

    #[test]
    fn mode_range_checked() {
        let engine = engine();
        let mut arg = 2u32.to_le_bytes();
        ioctl(&engine, SIMTEMP_SET_MODE, &mut arg).unwrap();
        assert_eq!(engine.config().mode, Mode::Ramp);

        let mut arg = 3u32.to_le_bytes();
        let err = ioctl(&engine, SIMTEMP_SET_MODE, &mut arg).unwrap_err();
        assert_eq!(err.code(), 22);
        assert_eq!(engine.config().mode, Mode::Ramp);
    }

    #[test]
    fn unknown_request() {
        let engine = engine();
        let mut arg = [0u8; 16];
        let err = ioctl(&engine, iow(SIMTEMP_IOC_MAGIC, 9, 4), &mut arg).unwrap_err();
        assert!(matches!(err, DeviceError::NotTty(_)));
        assert_eq!(err.code(), 25);
    }

    #[test]
    fn get_stats_fills_buffer() {
        let engine = engine();
        for _ in 0..33 {
            engine.tick();
        }
        let mut arg = [0xFFu8; 20];
        ioctl(&engine, SIMTEMP_GET_STATS, &mut arg).unwrap();

        let reply = StatsReply::from_bytes(&arg).unwrap();
        assert_eq!(reply.samples_produced, 32);
        assert_eq!(reply.queue_overflow_errors, 1);
        assert_eq!(reply.last_error, 28);
        assert_eq!(&arg[16..], &[0xFF; 4]);
    }

    #[test]
    fn stats_reply_layout() {
        let reply = StatsReply {
            samples_produced: 1,
            alerts_triggered: 2,
            queue_overflow_errors: 3,
            last_error: 0x0102_0304,
        };
        let bytes = reply.to_bytes();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[4, 3, 2, 1]);
        assert_eq!(StatsReply::from_bytes(&bytes).unwrap(), reply);
    }
}
