//! Fixed-size binary record format
//!
//! Samples leave the engine as flat 16-byte little-endian records:
//!
//! ```text
//! offset  size  field
//! 0       8     timestamp_ns   (u64)
//! 8       4     temp_mC        (i32)
//! 12      4     flags          (u32)
//! ```
//!
//! There is no header, no length prefix and no padding. A file of samples is
//! just N records back to back; external tooling depends on this layout.

use std::io::{self, Read};

use crate::errors::{SimTempError, SimTempResult};
use crate::sample::{Sample, SampleFlags};

/// Size of one serialized sample in bytes
pub const RECORD_SIZE: usize = 16;

/// Serialize a sample
pub fn encode(sample: &Sample) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    out[0..8].copy_from_slice(&sample.timestamp_ns.to_le_bytes());
    out[8..12].copy_from_slice(&sample.temperature_mc.to_le_bytes());
    out[12..16].copy_from_slice(&sample.flags.bits().to_le_bytes());
    out
}

/// Serialize a sample into the front of `buf`
///
/// Returns the number of bytes written, always [`RECORD_SIZE`].
pub fn encode_into(sample: &Sample, buf: &mut [u8]) -> SimTempResult<usize> {
    if buf.len() < RECORD_SIZE {
        return Err(SimTempError::ShortBuffer {
            needed: RECORD_SIZE,
            got: buf.len(),
        });
    }
    buf[..RECORD_SIZE].copy_from_slice(&encode(sample));
    Ok(RECORD_SIZE)
}

/// Parse one record from the front of `data`
pub fn decode(data: &[u8]) -> SimTempResult<Sample> {
    let record: &[u8; RECORD_SIZE] = data
        .get(..RECORD_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(SimTempError::ShortBuffer {
            needed: RECORD_SIZE,
            got: data.len(),
        })?;

    let timestamp_ns = u64::from_le_bytes([
        record[0], record[1], record[2], record[3],
        record[4], record[5], record[6], record[7],
    ]);
    let temperature_mc = i32::from_le_bytes([record[8], record[9], record[10], record[11]]);
    let flags = u32::from_le_bytes([record[12], record[13], record[14], record[15]]);

    Ok(Sample {
        timestamp_ns,
        temperature_mc,
        flags: SampleFlags::from_bits(flags),
    })
}

/// Decode every whole record in `data`
///
/// Returns the samples and the number of trailing bytes that did not form a
/// complete record.
pub fn decode_all(data: &[u8]) -> (Vec<Sample>, usize) {
    let chunks = data.chunks_exact(RECORD_SIZE);
    let trailing = chunks.remainder().len();
    let samples = chunks.filter_map(|chunk| decode(chunk).ok()).collect();
    (samples, trailing)
}

/// Streaming decoder over any byte source
///
/// Yields whole records until EOF. A short final record is not an error; it
/// is skipped and reported through [`RecordReader::trailing_bytes`].
pub struct RecordReader<R> {
    inner: R,
    records_read: usize,
    trailing: usize,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            records_read: 0,
            trailing: 0,
            done: false,
        }
    }

    /// Number of records decoded so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Bytes left over after the last whole record (valid once exhausted)
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }

    /// Fill one record buffer, tolerating short reads from the source
    fn fill(&mut self, buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = io::Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RECORD_SIZE];
        match self.fill(&mut buf) {
            Ok(RECORD_SIZE) => {
                self.records_read += 1;
                decode(&buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
                    .into()
            }
            Ok(partial) => {
                self.trailing = partial;
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_little_endian() {
        let sample = Sample {
            timestamp_ns: 0x0102_0304_0506_0708,
            temperature_mc: -2,
            flags: SampleFlags::NEW_SAMPLE | SampleFlags::THRESHOLD_CROSSED,
        };
        let bytes = encode(&sample);
        assert_eq!(&bytes[0..8], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[8..12], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[12..16], &[0x03, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn two_concatenated_records() {
        let first = Sample::new(1_000, 40_250, false);
        let second = Sample::new(2_000, 42_000, true);
        let mut data = Vec::new();
        data.extend_from_slice(&encode(&first));
        data.extend_from_slice(&encode(&second));

        let (samples, trailing) = decode_all(&data);
        assert_eq!(trailing, 0);
        assert_eq!(samples, vec![first, second]);
        assert!(!samples[0].flags.contains(SampleFlags::THRESHOLD_CROSSED));
        assert!(samples[1].flags.contains(SampleFlags::THRESHOLD_CROSSED));
    }

    #[test]
    fn short_buffers_rejected() {
        let sample = Sample::new(1, 2, false);
        let mut small = [0u8; 15];
        assert_eq!(
            encode_into(&sample, &mut small),
            Err(SimTempError::ShortBuffer { needed: 16, got: 15 })
        );
        assert!(decode(&small).is_err());

        // Larger buffers only get the first record written
        let mut big = [0xAAu8; 20];
        assert_eq!(encode_into(&sample, &mut big), Ok(RECORD_SIZE));
        assert_eq!(&big[16..], &[0xAA; 4]);
    }

    #[test]
    fn reader_skips_partial_tail() {
        let mut data = encode(&Sample::new(5, 39_000, false)).to_vec();
        data.extend_from_slice(&[1, 2, 3]);

        let mut reader = RecordReader::new(data.as_slice());
        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.timestamp_ns, 5);
        assert!(reader.next().is_none());
        assert_eq!(reader.records_read(), 1);
        assert_eq!(reader.trailing_bytes(), 3);
    }
}
