//! EfficiencyFactor: machine speed relative to the routing standard.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Duration, ValidationError};

const MIN_PERCENT: u16 = 10;
const MAX_PERCENT: u16 = 200;

/// Bounded ratio in [0.1, 2.0], held as a whole percentage.
///
/// 100% runs at standard time; 200% halves it; 50% doubles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct EfficiencyFactor(u16);

impl EfficiencyFactor {
    /// Standard efficiency (100%).
    pub const STANDARD: Self = Self(100);

    pub fn from_percentage(percent: u16) -> Result<Self, ValidationError> {
        if !(MIN_PERCENT..=MAX_PERCENT).contains(&percent) {
            return Err(ValidationError::out_of_range(
                "efficiency_factor",
                i64::from(MIN_PERCENT),
                i64::from(MAX_PERCENT),
                i64::from(percent),
            ));
        }
        Ok(Self(percent))
    }

    /// Creates a factor from a ratio such as `1.25`, rounded to a whole percent.
    pub fn from_ratio(ratio: f64) -> Result<Self, ValidationError> {
        if !ratio.is_finite() || !(0.0..=f64::from(u16::MAX) / 100.0).contains(&ratio) {
            return Err(ValidationError::invalid_format(
                "efficiency_factor",
                format!("{} is not a usable ratio", ratio),
            ));
        }
        Self::from_percentage((ratio * 100.0).round() as u16)
    }

    pub fn percentage(&self) -> u16 {
        self.0
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Whole minutes the work takes at this efficiency, never less than one.
    pub fn apply_to_duration(&self, minutes: i64) -> i64 {
        (minutes.max(0) * 100 / i64::from(self.0)).max(1)
    }

    /// Duration variant of `apply_to_duration` keeping fractional minutes.
    ///
    /// Floored at one minute.
    pub fn adjust(&self, standard: &Duration) -> Duration {
        let minimum = Duration::from_minutes(1).unwrap_or(Duration::ZERO);
        let scaled = standard
            .multiply(100.0 / f64::from(self.0))
            .unwrap_or(*standard);
        scaled.max(minimum)
    }
}

impl Default for EfficiencyFactor {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TryFrom<u16> for EfficiencyFactor {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_percentage(value)
    }
}

impl From<EfficiencyFactor> for u16 {
    fn from(factor: EfficiencyFactor) -> Self {
        factor.0
    }
}

impl fmt::Display for EfficiencyFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
