//! Start-up configuration loader
//!
//! Reads the device's property document, a flat JSON object such as
//!
//! ```json
//! { "compatible": "nxp,simtemp", "sampling-ms": 100, "threshold-mC": 45000 }
//! ```
//!
//! Only `sampling-ms` and `threshold-mC` are used; other keys are ignored
//! and missing ones fall back to the defaults. Values are validated here so
//! a bad document fails before a device is probed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use simtemp_core::InitialConfig;

use crate::{DeviceError, DeviceResult};

fn validated(initial: InitialConfig) -> DeviceResult<InitialConfig> {
    initial.resolve()?;
    Ok(initial)
}

/// Parse a property document held in memory
pub fn from_str(json: &str) -> DeviceResult<InitialConfig> {
    let initial = serde_json::from_str(json).map_err(|e| DeviceError::Config(e.to_string()))?;
    validated(initial)
}

/// Parse a property document from any reader
pub fn from_reader<R: Read>(reader: R) -> DeviceResult<InitialConfig> {
    let initial = serde_json::from_reader(reader).map_err(|e| DeviceError::Config(e.to_string()))?;
    validated(initial)
}

/// Load a property document from a file
pub fn from_path<P: AsRef<Path>>(path: P) -> DeviceResult<InitialConfig> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| DeviceError::Config(format!("{}: {}", path.display(), e)))?;
    let initial = from_reader(BufReader::new(file))?;
    info!("loaded device properties from {}", path.display());
    Ok(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simtemp_core::SimTempError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn full_document() {
        let initial =
            from_str(r#"{"compatible": "nxp,simtemp", "sampling-ms": 100, "threshold-mC": 45000}"#)
                .unwrap();
        assert_eq!(initial.sampling_ms, Some(100));
        assert_eq!(initial.threshold_mc, Some(45_000));
    }

    #[test]
    fn missing_values_default() {
        let initial = from_str("{}").unwrap();
        let config = initial.resolve().unwrap();
        assert_eq!(config.sampling_period_ms, 50);
        assert_eq!(config.threshold_mc, 41_000);
    }

    #[test]
    fn out_of_range_rejected() {
        let err = from_str(r#"{"sampling-ms": 5}"#).unwrap_err();
        assert!(matches!(err, DeviceError::Engine(SimTempError::InvalidArgument { .. })));
    }

    #[test]
    fn malformed_rejected() {
        assert!(matches!(from_str("{"), Err(DeviceError::Config(_))));
        assert!(matches!(from_str(r#"{"sampling-ms": "fast"}"#), Err(DeviceError::Config(_))));
    }

    #[test]
    fn from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"threshold-mC": -5000}}"#).unwrap();
        file.flush().unwrap();

        let initial = from_path(file.path()).unwrap();
        assert_eq!(initial.threshold_mc, Some(-5000));
        assert_eq!(initial.sampling_ms, None);

        assert!(matches!(from_path("/nonexistent/simtemp.json"), Err(DeviceError::Config(_))));
    }
}
