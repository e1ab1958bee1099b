//! Tests for the on-disk record format

use std::fs::File;
use std::io::{BufReader, Write};

use simtemp_core::{
    record::{self, RecordReader},
    ReadMode, SampleFlags, RECORD_SIZE,
};
use tempfile::NamedTempFile;

mod common;

use common::{ramp_engine, tick_n};

#[test]
fn test_engine_samples_survive_file() {
    let (engine, clock) = ramp_engine();
    engine.set_threshold(30_000);
    tick_n(&engine, &clock, 8);

    let reader = engine.reader();
    let mut temp_file = NamedTempFile::new().unwrap();
    let mut written = Vec::new();
    while let Ok(sample) = reader.read(ReadMode::NonBlocking) {
        temp_file.write_all(&record::encode(&sample)).unwrap();
        written.push(sample);
    }
    temp_file.flush().unwrap();

    let len = std::fs::metadata(temp_file.path()).unwrap().len();
    assert_eq!(len as usize, 8 * RECORD_SIZE);

    let file = BufReader::new(File::open(temp_file.path()).unwrap());
    let decoded: Vec<_> = RecordReader::new(file).map(|r| r.unwrap()).collect();
    assert_eq!(decoded, written);

    // 26000..33000: only 32000 and 33000 follow a value above 30000
    let alerts = decoded
        .iter()
        .filter(|s| s.flags.contains(SampleFlags::THRESHOLD_CROSSED))
        .count();
    assert_eq!(alerts, 2);
}

#[test]
fn test_truncated_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let sample = simtemp_core::Sample::new(123, 45_600, true);
    temp_file.write_all(&record::encode(&sample)).unwrap();
    temp_file.write_all(&record::encode(&sample)[..10]).unwrap();
    temp_file.flush().unwrap();

    let mut reader = RecordReader::new(File::open(temp_file.path()).unwrap());
    assert_eq!(reader.next().unwrap().unwrap(), sample);
    assert!(reader.next().is_none());
    assert_eq!(reader.records_read(), 1);
    assert_eq!(reader.trailing_bytes(), 10);
}

#[test]
fn test_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut reader = RecordReader::new(File::open(temp_file.path()).unwrap());
    assert!(reader.next().is_none());
    assert_eq!(reader.trailing_bytes(), 0);
}
