//! Cost value object: an exact monetary amount in a single currency.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Duration, ValidationError, ValueObjectError};

/// Fixed-point scale: amounts are held in ten-thousandths of a currency unit.
const SCALE: i64 = 10_000;
const UNITS_PER_CENT: i64 = SCALE / 100;

/// Three-letter ISO 4217 style currency code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("'{}' is not a three-letter currency code", code),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative amount of money.
///
/// All arithmetic between two costs requires the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    units: i64,
    currency: Currency,
}

impl Cost {
    /// Creates a cost of whole currency units.
    pub fn new(amount: i64, currency: &str) -> Result<Self, ValidationError> {
        Self::from_units(amount.saturating_mul(SCALE), amount, currency)
    }

    /// Creates a cost from a number of cents.
    pub fn from_cents(cents: i64, currency: &str) -> Result<Self, ValidationError> {
        Self::from_units(cents.saturating_mul(UNITS_PER_CENT), cents, currency)
    }

    /// Parses a decimal amount such as `"12.50"` (up to four fractional digits).
    pub fn parse(amount: &str, currency: &str) -> Result<Self, ValidationError> {
        let amount = amount.trim();
        let invalid = || ValidationError::invalid_format("amount", format!("'{}'", amount));
        let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
        if whole.is_empty()
            || fraction.len() > 4
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            format!("{:0<4}", fraction).parse().map_err(|_| invalid())?
        };
        let units = whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(invalid)?;
        Self::from_units(units, whole, currency)
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: &Currency) -> Self {
        Self {
            units: 0,
            currency: currency.clone(),
        }
    }

    fn from_units(units: i64, reported: i64, currency: &str) -> Result<Self, ValidationError> {
        if units < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, reported));
        }
        Ok(Self {
            units,
            currency: Currency::new(currency)?,
        })
    }

    fn with_units(&self, units: i64, operation: &'static str) -> Result<Self, ValueObjectError> {
        if units < 0 {
            return Err(ValueObjectError::NegativeCost {
                operation,
                amount: format_units(units),
            });
        }
        Ok(Self {
            units,
            currency: self.currency.clone(),
        })
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// The amount as a float, for display and reporting only.
    pub fn amount(&self) -> f64 {
        self.units as f64 / SCALE as f64
    }

    /// The amount in cents, rounded half away from zero.
    pub fn cents(&self) -> i64 {
        div_round(i128::from(self.units), i128::from(UNITS_PER_CENT))
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    fn ensure_same_currency(&self, other: &Cost) -> Result<(), ValueObjectError> {
        if self.currency != other.currency {
            return Err(ValueObjectError::CurrencyMismatch {
                left: self.currency.to_string(),
                right: other.currency.to_string(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Cost) -> Result<Cost, ValueObjectError> {
        self.ensure_same_currency(other)?;
        self.with_units(self.units.saturating_add(other.units), "add")
    }

    pub fn subtract(&self, other: &Cost) -> Result<Cost, ValueObjectError> {
        self.ensure_same_currency(other)?;
        self.with_units(self.units - other.units, "subtract")
    }

    /// Raises (positive) or lowers (negative) the amount by a percentage.
    pub fn adjust_by_percentage(&self, percent: f64) -> Result<Cost, ValueObjectError> {
        self.multiply(1.0 + percent / 100.0)
    }

    /// Scales by a non-negative factor.
    pub fn multiply(&self, factor: f64) -> Result<Cost, ValueObjectError> {
        if !factor.is_finite() {
            return Err(ValueObjectError::NegativeCost {
                operation: "multiply",
                amount: format!("{} x {}", format_units(self.units), factor),
            });
        }
        self.with_units((self.units as f64 * factor).round() as i64, "multiply")
    }

    /// Cost of a single unit when this amount covers `quantity` units.
    pub fn per_unit(&self, quantity: u32) -> Result<Cost, ValueObjectError> {
        if quantity == 0 {
            return Err(ValueObjectError::DivisionByZero {
                operation: "per_unit",
            });
        }
        self.with_units(
            div_round(i128::from(self.units), i128::from(quantity)),
            "per_unit",
        )
    }

    /// Hourly rate when this amount covers `duration` of work.
    pub fn per_hour(&self, duration: &Duration) -> Result<Cost, ValueObjectError> {
        if duration.is_zero() {
            return Err(ValueObjectError::DivisionByZero {
                operation: "per_hour",
            });
        }
        // hundredths of a minute per hour = 6000
        self.with_units(
            div_round(
                i128::from(self.units) * 6_000,
                i128::from(duration.hundredths()),
            ),
            "per_hour",
        )
    }

    /// Treating this cost as an hourly rate, the charge for `duration`.
    pub fn for_duration(&self, duration: &Duration) -> Cost {
        let units = div_round(
            i128::from(self.units) * i128::from(duration.hundredths()),
            6_000,
        );
        Cost {
            units,
            currency: self.currency.clone(),
        }
    }

    /// Rounds to whole cents, half away from zero.
    pub fn round_to_cents(&self) -> Cost {
        Cost {
            units: self.cents() * UNITS_PER_CENT,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_cents();
        write!(
            f,
            "{}.{:02} {}",
            rounded.units / SCALE,
            (rounded.units % SCALE) / UNITS_PER_CENT,
            self.currency
        )
    }
}

fn div_round(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    };
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

fn format_units(units: i64) -> String {
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.abs();
    format!("{}{}.{:04}", sign, abs / SCALE, abs % SCALE)
}
