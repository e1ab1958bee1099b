//! Shared helpers for engine integration tests
//!
//! - Deterministic engine construction (fixed seed, manual clock)
//! - Helpers that drive the ramp to a known point
//! - Draining helpers for the reader interface

#![allow(dead_code)]

use simtemp_core::{Engine, ManualClock, Mode, ReadMode, Reader, Sample, SimTempError};

/// Clock step used between manual ticks, 50 ms in nanoseconds
pub const TICK_NS: u64 = 50_000_000;

/// Engine in ramp mode with a manual clock starting at zero
pub fn ramp_engine() -> (Engine, ManualClock) {
    let clock = ManualClock::new(0);
    let engine = Engine::builder()
        .mode(Mode::Ramp)
        .seed(42)
        .clock(clock.clone())
        .build()
        .expect("default config is valid");
    (engine, clock)
}

/// Tick `n` times, advancing the clock one period before each tick
pub fn tick_n(engine: &Engine, clock: &ManualClock, n: usize) {
    for _ in 0..n {
        clock.advance(TICK_NS);
        engine.tick();
    }
}

/// Pop everything currently queued
pub fn drain(reader: &Reader) -> Vec<Sample> {
    let mut samples = Vec::new();
    loop {
        match reader.read(ReadMode::NonBlocking) {
            Ok(sample) => samples.push(sample),
            Err(SimTempError::WouldBlock) => return samples,
            Err(e) => panic!("unexpected read error: {e}"),
        }
    }
}
