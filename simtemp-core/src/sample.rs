//! Sample type and status flags
//!
//! A [`Sample`] is one timestamped reading produced by a tick. It is
//! immutable once built; the queue hands out copies.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Bit flags attached to every sample
///
/// Values are part of the record format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleFlags(u32);

impl SampleFlags {
    /// Set on every sample produced by the engine
    pub const NEW_SAMPLE: Self = Self(1 << 0);
    /// Set when the tick raised a threshold alert
    pub const THRESHOLD_CROSSED: Self = Self(1 << 1);

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap raw bits, keeping unknown bits intact
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit value
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Add the bits of `other`
    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// True when every bit of `other` is present
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Iterate over the names of the known flags that are set
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        [
            (Self::NEW_SAMPLE, "NEW_SAMPLE"),
            (Self::THRESHOLD_CROSSED, "THRESHOLD_CROSSED"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }
}

impl core::ops::BitOr for SampleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for SampleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// One temperature reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Temperature in milli-degrees Celsius
    pub temperature_mc: i32,
    /// Status flags
    pub flags: SampleFlags,
}

impl Sample {
    /// Build a sample as the ticker does: `NEW_SAMPLE` always set
    pub fn new(timestamp_ns: u64, temperature_mc: i32, alert: bool) -> Self {
        let mut flags = SampleFlags::NEW_SAMPLE;
        if alert {
            flags.set(SampleFlags::THRESHOLD_CROSSED);
        }
        Self {
            timestamp_ns,
            temperature_mc,
            flags,
        }
    }

    /// Whether this sample carries an alert
    pub const fn is_alert(&self) -> bool {
        self.flags.contains(SampleFlags::THRESHOLD_CROSSED)
    }

    /// Temperature in degrees Celsius, for display
    pub fn celsius(&self) -> f64 {
        f64::from(self.temperature_mc) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values_are_fixed() {
        assert_eq!(SampleFlags::NEW_SAMPLE.bits(), 0x1);
        assert_eq!(SampleFlags::THRESHOLD_CROSSED.bits(), 0x2);
    }

    #[test]
    fn new_sample_always_flagged() {
        let quiet = Sample::new(10, 40_000, false);
        assert_eq!(quiet.flags, SampleFlags::NEW_SAMPLE);
        assert!(!quiet.is_alert());

        let alert = Sample::new(20, 42_000, true);
        assert!(alert.flags.contains(SampleFlags::NEW_SAMPLE));
        assert!(alert.is_alert());
        assert_eq!(alert.flags.bits(), 0x3);
    }

    #[test]
    fn flag_names_and_display() {
        let flags = SampleFlags::NEW_SAMPLE | SampleFlags::THRESHOLD_CROSSED;
        let names: Vec<_> = flags.names().collect();
        assert_eq!(names, vec!["NEW_SAMPLE", "THRESHOLD_CROSSED"]);
        assert_eq!(format!("{}", SampleFlags::NEW_SAMPLE), "0x00000001");

        // Unknown bits survive but have no name
        let odd = SampleFlags::from_bits(0x8);
        assert_eq!(odd.names().count(), 0);
    }

    #[test]
    fn celsius_conversion() {
        let sample = Sample::new(0, 41_500, false);
        assert_eq!(sample.celsius(), 41.5);
    }
}
