//! Currency amounts in integer minor units.

use serde::{Deserialize, Serialize};

/// Number of minor units in one major unit.
const MINOR_PER_MAJOR: i64 = 100;

/// Money amount represented in minor units (cents) to avoid floating point drift.
///
/// All sums are exact integer additions. The only place a fractional value
/// enters is [`Money::checked_scale`], which rounds once to the nearest minor unit,
/// half away from zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole major units.
    pub const fn from_major(major: i64) -> Self {
        Self {
            cents: major * MINOR_PER_MAJOR,
        }
    }

    /// Converts a major-unit decimal into money, rounding to the nearest minor unit.
    pub fn from_major_f64(major: f64) -> Self {
        Self {
            cents: (major * MINOR_PER_MAJOR as f64).round() as i64,
        }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole major-unit portion.
    pub fn major(&self) -> i64 {
        self.cents / MINOR_PER_MAJOR
    }

    /// Returns the minor-unit remainder.
    pub fn minor_part(&self) -> i64 {
        self.cents.abs() % MINOR_PER_MAJOR
    }

    /// Returns the amount as a major-unit decimal, for wire formats only.
    pub fn as_major_f64(&self) -> f64 {
        self.cents as f64 / MINOR_PER_MAJOR as f64
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, or `None` if the result does not fit.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` if the result does not fit.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Multiplies by a fractional factor (an area, typically).
    ///
    /// Rounds to the nearest minor unit, half away from zero. `None` if the
    /// result is not representable.
    pub fn checked_scale(&self, factor: f64) -> Option<Money> {
        let cents = (self.cents as f64 * factor).round();
        if !cents.is_finite() || cents < i64::MIN as f64 || cents >= i64::MAX as f64 {
            return None;
        }
        Some(Money::from_cents(cents as i64))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.major().abs(), self.minor_part())
        } else {
            write!(f, "{}.{:02}", self.major(), self.minor_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Serde adapter that writes money as a major-unit JSON number (`3250.5`).
///
/// Used on the message bus, where peers exchange plain decimal prices.
pub mod major_units {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.as_major_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("money must be a finite number"));
        }
        Ok(Money::from_major_f64(value))
    }
}
