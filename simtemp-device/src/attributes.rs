//! Text attribute surface
//!
//! Each attribute is a small text file: reading it shows the current value
//! followed by a newline, writing it parses a new value.
//!
//! | Name | Access | Format |
//! |------|--------|--------|
//! | `sampling_ms` | rw | decimal, 10..=10000 |
//! | `threshold_mC` | rw | signed decimal |
//! | `mode` | rw | `normal`, `noisy` or `ramp` |
//! | `stats` | ro | four `name: value` lines |
//!
//! Input may carry one trailing newline (what `echo` appends) and nothing
//! else. A successful store consumes the whole input.

use core::fmt;
use core::str::FromStr;

use log::warn;
use simtemp_core::{Engine, Mode};

use crate::{DeviceError, DeviceResult};

/// Largest text an attribute can show
pub const SHOW_BUFFER_SIZE: usize = 256;

/// Rendered attribute value
pub type AttrText = heapless::String<SHOW_BUFFER_SIZE>;

/// Attributes exposed by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Sampling period in milliseconds
    SamplingMs,
    /// Alert threshold in milli-degrees Celsius
    ThresholdMc,
    /// Signal model
    Mode,
    /// Engine counters
    Stats,
}

impl Attribute {
    /// Every attribute, in listing order
    pub const ALL: [Attribute; 4] = [
        Attribute::SamplingMs,
        Attribute::ThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    /// File name of the attribute
    pub const fn name(&self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::ThresholdMc => "threshold_mC",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    /// Whether `store` is allowed
    pub const fn is_writable(&self) -> bool {
        !matches!(self, Attribute::Stats)
    }
}

impl FromStr for Attribute {
    type Err = DeviceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == name)
            .ok_or_else(|| DeviceError::NoSuchAttribute(name.to_string()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drop the single newline `echo` appends
fn strip_newline(input: &str) -> &str {
    input.strip_suffix('\n').unwrap_or(input)
}

fn parse_decimal<T: FromStr>(what: &'static str, input: &str) -> DeviceResult<T> {
    strip_newline(input).parse().map_err(|_| DeviceError::Parse {
        what,
        input: input.to_string(),
    })
}

fn render(text: String) -> DeviceResult<AttrText> {
    AttrText::try_from(text.as_str()).map_err(|_| DeviceError::Fault {
        needed: text.len(),
        got: SHOW_BUFFER_SIZE,
    })
}

/// Attribute view over one engine
pub struct Attributes<'a> {
    engine: &'a Engine,
}

impl<'a> Attributes<'a> {
    /// Attach to `engine`
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Show the attribute called `name`
    pub fn show(&self, name: &str) -> DeviceResult<AttrText> {
        self.show_attr(name.parse()?)
    }

    /// Show one attribute
    pub fn show_attr(&self, attr: Attribute) -> DeviceResult<AttrText> {
        match attr {
            Attribute::SamplingMs => {
                render(format!("{}\n", self.engine.config().sampling_period_ms))
            }
            Attribute::ThresholdMc => render(format!("{}\n", self.engine.config().threshold_mc)),
            Attribute::Mode => render(format!("{}\n", self.engine.config().mode)),
            Attribute::Stats => {
                let stats = self.engine.stats();
                render(format!(
                    "samples_produced: {}\nalerts_triggered: {}\nqueue_overflow_errors: {}\nlast_error: {}\n",
                    stats.samples_produced,
                    stats.alerts_triggered,
                    stats.queue_overflow_errors,
                    stats.last_error
                ))
            }
        }
    }

    /// Store `input` into the attribute called `name`
    ///
    /// Returns the number of bytes consumed, always `input.len()`.
    pub fn store(&self, name: &str, input: &str) -> DeviceResult<usize> {
        self.store_attr(name.parse()?, input)
    }

    /// Store `input` into one attribute
    pub fn store_attr(&self, attr: Attribute, input: &str) -> DeviceResult<usize> {
        match attr {
            Attribute::SamplingMs => {
                let ms: u32 = parse_decimal("sampling_ms", input)?;
                self.engine.set_sampling_period(ms)?;
            }
            Attribute::ThresholdMc => {
                let mc: i32 = parse_decimal("threshold_mC", input)?;
                self.engine.set_threshold(mc);
            }
            Attribute::Mode => {
                let mode: Mode = strip_newline(input).parse().map_err(|e| {
                    warn!("unknown mode {:?}", input);
                    DeviceError::Engine(e)
                })?;
                self.engine.set_mode(mode);
            }
            Attribute::Stats => return Err(DeviceError::ReadOnly(attr.name())),
        }
        Ok(input.len())
    }
}
