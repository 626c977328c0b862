//! Duration value object measured in minutes.
//!
//! Held as exact fixed-point hundredths of a minute so that repeated
//! additions never drift the way binary floating point does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

use super::{Timestamp, ValidationError, ValueObjectError};

const HUNDREDTHS_PER_MINUTE: i64 = 100;
const MILLIS_PER_HUNDREDTH: i64 = 600;

/// A non-negative span of working time in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    hundredths: i64,
}

impl Duration {
    /// Zero minutes.
    pub const ZERO: Self = Self { hundredths: 0 };

    /// Creates a duration of whole minutes.
    pub fn from_minutes(minutes: i64) -> Result<Self, ValueObjectError> {
        Self::from_hundredths(minutes.saturating_mul(HUNDREDTHS_PER_MINUTE), "from_minutes")
    }

    /// Creates a duration of whole hours.
    pub fn from_hours(hours: i64) -> Result<Self, ValueObjectError> {
        Self::from_hundredths(
            hours.saturating_mul(60 * HUNDREDTHS_PER_MINUTE),
            "from_hours",
        )
    }

    /// Creates a duration from fractional minutes, rounded to the nearest hundredth.
    pub fn from_fractional_minutes(minutes: f64) -> Result<Self, ValueObjectError> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(ValueObjectError::NegativeDuration {
                operation: "from_fractional_minutes",
                minutes: minutes.to_string(),
            });
        }
        Ok(Self {
            hundredths: (minutes * HUNDREDTHS_PER_MINUTE as f64).round() as i64,
        })
    }

    /// Parses a decimal minute count such as `"12.5"` or `"90"`.
    ///
    /// At most two fractional digits are accepted.
    pub fn parse_minutes(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        let (whole, fraction) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        let invalid = || ValidationError::invalid_format("duration", format!("'{}'", value));
        if whole.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<2}", fraction);
            padded.parse().map_err(|_| invalid())?
        };
        let hundredths = whole
            .checked_mul(HUNDREDTHS_PER_MINUTE)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(invalid)?;
        Ok(Self { hundredths })
    }

    /// The span between two instants, rounded to the nearest hundredth of a minute.
    pub fn between(start: &Timestamp, end: &Timestamp) -> Result<Self, ValueObjectError> {
        let millis = end.duration_since(start).num_milliseconds();
        let hundredths = (millis + MILLIS_PER_HUNDREDTH / 2).div_euclid(MILLIS_PER_HUNDREDTH);
        if millis < 0 {
            return Err(ValueObjectError::NegativeDuration {
                operation: "between",
                minutes: format_hundredths(hundredths),
            });
        }
        Ok(Self { hundredths })
    }

    fn from_hundredths(hundredths: i64, operation: &'static str) -> Result<Self, ValueObjectError> {
        if hundredths < 0 {
            return Err(ValueObjectError::NegativeDuration {
                operation,
                minutes: format_hundredths(hundredths),
            });
        }
        Ok(Self { hundredths })
    }

    /// Minutes including the fractional part.
    pub fn minutes(&self) -> f64 {
        self.hundredths as f64 / HUNDREDTHS_PER_MINUTE as f64
    }

    /// Whole minutes, fractional part truncated.
    pub fn whole_minutes(&self) -> i64 {
        self.hundredths / HUNDREDTHS_PER_MINUTE
    }

    /// Whole minutes, any fractional part rounded up.
    pub fn ceil_minutes(&self) -> i64 {
        (self.hundredths + HUNDREDTHS_PER_MINUTE - 1) / HUNDREDTHS_PER_MINUTE
    }

    /// Hours including the fractional part.
    pub fn hours(&self) -> f64 {
        self.minutes() / 60.0
    }

    /// The exact fixed-point representation.
    pub fn hundredths(&self) -> i64 {
        self.hundredths
    }

    pub fn is_zero(&self) -> bool {
        self.hundredths == 0
    }

    /// Returns the sum of two durations.
    pub fn add(&self, other: &Duration) -> Duration {
        Duration {
            hundredths: self.hundredths.saturating_add(other.hundredths),
        }
    }

    /// Returns `self - other`, failing if the result would be negative.
    pub fn subtract(&self, other: &Duration) -> Result<Duration, ValueObjectError> {
        Self::from_hundredths(self.hundredths - other.hundredths, "subtract")
    }

    /// Difference clamped at zero.
    pub fn saturating_sub(&self, other: &Duration) -> Duration {
        Duration {
            hundredths: (self.hundredths - other.hundredths).max(0),
        }
    }

    /// Scales by a non-negative factor, rounding to the nearest hundredth.
    pub fn multiply(&self, factor: f64) -> Result<Duration, ValueObjectError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(ValueObjectError::NegativeDuration {
                operation: "multiply",
                minutes: format!("{} x {}", format_hundredths(self.hundredths), factor),
            });
        }
        Ok(Duration {
            hundredths: (self.hundredths as f64 * factor).round() as i64,
        })
    }

    /// Scales by a whole count without rounding.
    pub fn times(&self, count: u32) -> Duration {
        Duration {
            hundredths: self.hundredths.saturating_mul(i64::from(count)),
        }
    }

    /// Converts to a chrono duration for timestamp arithmetic.
    pub fn to_chrono(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.hundredths * MILLIS_PER_HUNDREDTH)
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::ZERO, |acc, d| acc.add(&d))
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", format_hundredths(self.hundredths))
    }
}

fn format_hundredths(hundredths: i64) -> String {
    let sign = if hundredths < 0 { "-" } else { "" };
    let abs = hundredths.abs();
    format!(
        "{}{}.{:02}",
        sign,
        abs / HUNDREDTHS_PER_MINUTE,
        abs % HUNDREDTHS_PER_MINUTE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mins(m: i64) -> Duration {
        Duration::from_minutes(m).unwrap()
    }

    #[test]
    fn from_hours_converts_to_minutes() {
        assert_eq!(Duration::from_hours(2).unwrap(), mins(120));
        assert_eq!(mins(90).hours(), 1.5);
    }

    #[test]
    fn fractional_minutes_round_to_hundredths() {
        assert_eq!(Duration::from_fractional_minutes(12.5).unwrap().hundredths(), 1250);
        assert_eq!(Duration::from_fractional_minutes(1.0 / 3.0).unwrap().hundredths(), 33);
        assert_eq!(Duration::from_fractional_minutes(0.0).unwrap(), Duration::ZERO);
        assert!(Duration::from_fractional_minutes(-0.5).is_err());
        assert!(Duration::from_fractional_minutes(f64::INFINITY).is_err());
    }

    #[test]
    fn negative_construction_fails() {
        let err = Duration::from_minutes(-5).unwrap_err();
        assert!(matches!(
            err,
            ValueObjectError::NegativeDuration { operation: "from_minutes", .. }
        ));
    }

    #[test]
    fn subtract_below_zero_fails() {
        let err = mins(10).subtract(&mins(11)).unwrap_err();
        assert_eq!(
            err,
            ValueObjectError::NegativeDuration {
                operation: "subtract",
                minutes: "-1.00".to_string()
            }
        );
    }

    #[test]
    fn parse_minutes_keeps_fraction_exact() {
        let d = Duration::parse_minutes("12.5").unwrap();
        assert_eq!(d.hundredths(), 1250);
        assert_eq!(d.to_string(), "12.50 min");
        assert!(Duration::parse_minutes("1.234").is_err());
        assert!(Duration::parse_minutes("-3").is_err());
        assert!(Duration::parse_minutes("abc").is_err());
    }

    #[test]
    fn parse_minutes_rejects_values_beyond_range() {
        let err = Duration::parse_minutes("999999999999999999").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
        assert!(Duration::parse_minutes("99999999999999999999").is_err());
        assert_eq!(
            Duration::parse_minutes("92233720368547758.07").unwrap().hundredths(),
            i64::MAX
        );
    }

    #[test]
    fn repeated_addition_does_not_drift() {
        let tenth = Duration::parse_minutes("0.1").unwrap();
        let total: Duration = std::iter::repeat(tenth).take(1000).sum();
        assert_eq!(total, mins(100));
    }

    #[test]
    fn multiply_scales_and_rejects_negative_factor() {
        assert_eq!(mins(60).multiply(1.5).unwrap(), mins(90));
        assert!(mins(60).multiply(-1.0).is_err());
        assert!(mins(60).multiply(f64::NAN).is_err());
        assert_eq!(mins(15).times(4), mins(60));
    }

    #[test]
    fn between_measures_timestamps() {
        let start = Timestamp::parse("2024-01-15T08:00:00Z").unwrap();
        let end = Timestamp::parse("2024-01-15T09:30:30Z").unwrap();
        assert_eq!(Duration::between(&start, &end).unwrap().hundredths(), 9050);
        assert!(Duration::between(&end, &start).is_err());
    }

    #[test]
    fn to_chrono_round_trips_whole_minutes() {
        assert_eq!(mins(45).to_chrono(), chrono::Duration::minutes(45));
    }

    #[test]
    fn ceil_minutes_rounds_up_fraction() {
        assert_eq!(Duration::parse_minutes("10.01").unwrap().ceil_minutes(), 11);
        assert_eq!(mins(10).ceil_minutes(), 10);
    }

    proptest! {
        #[test]
        fn add_then_subtract_round_trips(a in 0i64..10_000_000, b in 0i64..10_000_000) {
            let a = Duration::from_hundredths(a, "test").unwrap();
            let b = Duration::from_hundredths(b, "test").unwrap();
            prop_assert_eq!(a.add(&b).subtract(&b).unwrap(), a);
        }

        #[test]
        fn subtract_past_zero_always_fails(a in 0i64..1_000_000, extra in 1i64..1_000_000) {
            let a = Duration::from_hundredths(a, "test").unwrap();
            let b = Duration::from_hundredths(a.hundredths() + extra, "test").unwrap();
            prop_assert!(a.subtract(&b).is_err());
        }
    }
}
