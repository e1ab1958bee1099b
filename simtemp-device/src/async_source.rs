//! Async sample source
//!
//! Blocking reads run on tokio's blocking pool so async consumers can await
//! samples without parking a runtime worker.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use simtemp_core::{Interrupter, Sample};
use tokio::task::JoinHandle;

use crate::node::{DeviceFile, OpenFlags, PollMask, SimTempDevice};
use crate::{DeviceError, DeviceResult};

/// Async version of the device read path
#[async_trait]
pub trait AsyncSampleSource: Send {
    /// Wait for the next sample
    async fn next_sample(&mut self) -> DeviceResult<Sample>;

    /// Current poll events
    fn readiness(&self) -> PollMask;
}

/// [`AsyncSampleSource`] over a blocking [`DeviceFile`]
///
/// A read whose future was dropped keeps its sample: the next
/// `next_sample` call picks up the same blocking read instead of starting
/// another one. Dropping the reader interrupts a read still running on the
/// blocking pool.
pub struct AsyncDeviceReader {
    file: Arc<DeviceFile>,
    interrupter: Interrupter,
    pending: Option<JoinHandle<DeviceResult<Sample>>>,
}

impl AsyncDeviceReader {
    /// Open a blocking file on `device`
    pub fn open(device: &SimTempDevice) -> Self {
        Self::from_file(device.open(OpenFlags::default()))
    }

    /// Wrap an open file, switching it to blocking reads
    pub fn from_file(mut file: DeviceFile) -> Self {
        file.set_nonblocking(false);
        let interrupter = file.interrupter();
        Self {
            file: Arc::new(file),
            interrupter,
            pending: None,
        }
    }
}

#[async_trait]
impl AsyncSampleSource for AsyncDeviceReader {
    async fn next_sample(&mut self) -> DeviceResult<Sample> {
        let file = &self.file;
        let handle = self.pending.get_or_insert_with(|| {
            let file = Arc::clone(file);
            tokio::task::spawn_blocking(move || file.read_sample())
        });
        let joined = handle.await;
        self.pending = None;
        joined.map_err(|e| DeviceError::Io(io::Error::new(io::ErrorKind::Other, e)))?
    }

    fn readiness(&self) -> PollMask {
        self.file.poll()
    }
}

impl Drop for AsyncDeviceReader {
    fn drop(&mut self) {
        self.interrupter.interrupt();
    }
}
