//! Signal models
//!
//! Each tick asks the active model for the next temperature. `Normal` and
//! `Noisy` are memoryless: a fixed base plus uniform noise. `Ramp` is a
//! deterministic triangle wave and the only model that carries state between
//! ticks.
//!
//! ```text
//! Ramp (1000 mC per tick):
//!   60000 ┤        /\        /\
//!         │       /  \      /  \
//!   25000 ┤  ... /    \    /    \
//!   20000 ┤            \/        \/
//! ```

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SimTempError;

/// Centre of the `Normal` and `Noisy` models
pub const BASE_TEMPERATURE_MC: i32 = 40_000;

/// Half-width of the `Normal` noise band
pub const NORMAL_SPREAD_MC: i32 = 1_000;

/// Half-width of the `Noisy` noise band
pub const NOISY_SPREAD_MC: i32 = 5_000;

/// Ramp step per tick
pub const RAMP_STEP_MC: i32 = 1_000;

/// Upper turning point of the ramp
pub const RAMP_MAX_MC: i32 = 60_000;

/// Lower turning point of the ramp
pub const RAMP_MIN_MC: i32 = 20_000;

/// Where the ramp restarts when the mode is selected
pub const RAMP_START_MC: i32 = 25_000;

/// Signal model selection
///
/// Discriminants are the values used by the binary command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Mode {
    /// 40 °C ± 1 °C
    #[default]
    Normal = 0,
    /// 40 °C ± 5 °C
    Noisy = 1,
    /// Triangle wave between 20 °C and 60 °C
    Ramp = 2,
}

impl Mode {
    /// All modes, in discriminant order
    pub const ALL: [Mode; 3] = [Mode::Normal, Mode::Noisy, Mode::Ramp];

    /// Text name used by the attribute surface
    pub const fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
        }
    }

    /// Numeric value used by the command surface
    pub const fn as_raw(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for Mode {
    type Error = SimTempError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Mode::Normal),
            1 => Ok(Mode::Noisy),
            2 => Ok(Mode::Ramp),
            _ => Err(SimTempError::InvalidArgument {
                what: "mode",
                value: i64::from(raw),
            }),
        }
    }
}

impl FromStr for Mode {
    type Err = SimTempError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or(SimTempError::InvalidArgument {
                what: "mode",
                value: -1,
            })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of the triangle wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampState {
    /// Last value produced, in mC
    pub base_mc: i32,
    /// Direction of travel
    pub rising: bool,
}

impl RampState {
    /// Fixed starting point used whenever `Ramp` is selected
    pub const fn start() -> Self {
        Self {
            base_mc: RAMP_START_MC,
            rising: true,
        }
    }

    /// Advance one tick and return the new value
    ///
    /// The value is clamped at the turning points and the direction flips on
    /// the tick that reaches them.
    pub fn step(&mut self) -> i32 {
        if self.rising {
            self.base_mc += RAMP_STEP_MC;
            if self.base_mc >= RAMP_MAX_MC {
                self.base_mc = RAMP_MAX_MC;
                self.rising = false;
            }
        } else {
            self.base_mc -= RAMP_STEP_MC;
            if self.base_mc <= RAMP_MIN_MC {
                self.base_mc = RAMP_MIN_MC;
                self.rising = true;
            }
        }
        self.base_mc
    }
}

impl Default for RampState {
    fn default() -> Self {
        Self::start()
    }
}

/// Uniform offset in `[-spread, +spread)` around the base temperature
fn noisy_reading<R: Rng + ?Sized>(rng: &mut R, spread: i32) -> i32 {
    BASE_TEMPERATURE_MC + rng.gen_range(-spread..spread)
}

/// Produce the next temperature for `mode`
///
/// Only `Ramp` touches `ramp`; the other models leave it alone so that a
/// later switch back into `Ramp` still starts from a clean reset.
pub fn next_temperature<R: Rng + ?Sized>(mode: Mode, ramp: &mut RampState, rng: &mut R) -> i32 {
    match mode {
        Mode::Normal => noisy_reading(rng, NORMAL_SPREAD_MC),
        Mode::Noisy => noisy_reading(rng, NOISY_SPREAD_MC),
        Mode::Ramp => ramp.step(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ramp_clamps_at_top() {
        let mut ramp = RampState { base_mc: 59_500, rising: true };
        assert_eq!(ramp.step(), 60_000);
        assert!(!ramp.rising);
        assert_eq!(ramp.step(), 59_000);
    }

    #[test]
    fn ramp_clamps_at_bottom() {
        let mut ramp = RampState { base_mc: 20_500, rising: false };
        assert_eq!(ramp.step(), 20_000);
        assert!(ramp.rising);
        assert_eq!(ramp.step(), 21_000);
    }

    #[test]
    fn ramp_full_cycle() {
        let mut ramp = RampState::start();
        let values: Vec<i32> = (0..80).map(|_| ramp.step()).collect();

        assert_eq!(values[0], 26_000);
        assert_eq!(*values.iter().max().unwrap(), RAMP_MAX_MC);
        assert_eq!(*values.iter().min().unwrap(), RAMP_MIN_MC);
        // Every step moves by exactly one increment
        assert!(values.windows(2).all(|w| (w[1] - w[0]).abs() == RAMP_STEP_MC));
    }

    #[test]
    fn normal_and_noisy_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ramp = RampState::start();

        for _ in 0..1_000 {
            let t = next_temperature(Mode::Normal, &mut ramp, &mut rng);
            assert!((39_000..41_000).contains(&t), "normal out of band: {t}");

            let t = next_temperature(Mode::Noisy, &mut ramp, &mut rng);
            assert!((35_000..45_000).contains(&t), "noisy out of band: {t}");
        }

        // Random models never touch the ramp
        assert_eq!(ramp, RampState::start());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("ramp".parse::<Mode>(), Ok(Mode::Ramp));
        assert!("Ramp".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());

        assert_eq!(Mode::try_from(1), Ok(Mode::Noisy));
        assert_eq!(
            Mode::try_from(3),
            Err(SimTempError::InvalidArgument { what: "mode", value: 3 })
        );
        assert_eq!(Mode::Noisy.to_string(), "noisy");
        assert_eq!(Mode::Ramp.as_raw(), 2);
    }
}
