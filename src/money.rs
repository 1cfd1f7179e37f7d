//! Fixed-point amounts of money with exactly two fractional digits.
//!
//! Amounts are never represented as binary floating point. They are stored in
//! the database as TEXT and serialized to JSON as strings, e.g. `"3000000.00"`.
//! JSON input may be either a string or a number.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The number of fractional digits kept for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Amounts must be strictly smaller than this in magnitude, i.e. at most 13
/// integer digits.
const MONEY_LIMIT: Decimal = dec!(10_000_000_000_000);

/// Errors from parsing or constructing an amount of money.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum MoneyError {
    /// The text is not a decimal number.
    #[error("\"{0}\" is not a valid amount")]
    Malformed(String),

    /// The amount has more than 13 integer digits.
    #[error("{0} is too large, amounts must be less than 10000000000000")]
    OutOfRange(Decimal),
}

/// An amount of money with exactly [MONEY_SCALE] fractional digits.
///
/// Values with more digits are rounded half away from zero when the amount is
/// created. Parsing accepts any magnitude, request input is range checked
/// with [Money::within_limit].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero, written as "0.00".
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Create an amount from a decimal, rounding to two fractional digits.
    ///
    /// # Errors
    ///
    /// Returns [MoneyError::OutOfRange] if the amount has more than 13 integer digits.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        Self::rounded(value).within_limit()
    }

    /// Round `value` to two fractional digits without checking its magnitude.
    ///
    /// Totals and shortfalls derived from valid amounts may exceed the input
    /// limit, so stored and computed amounts are built with this.
    pub fn rounded(value: Decimal) -> Self {
        let mut value =
            value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(MONEY_SCALE);

        Self(value)
    }

    /// Check that the amount has at most 13 integer digits.
    ///
    /// # Errors
    ///
    /// Returns [MoneyError::OutOfRange] if the amount is too large.
    pub fn within_limit(self) -> Result<Self, MoneyError> {
        if self.0.abs() >= MONEY_LIMIT {
            return Err(MoneyError::OutOfRange(self.0));
        }

        Ok(self)
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whether the amount is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

// Two amounts with the same scale keep that scale when added or subtracted.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |total, amount| total + amount)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| MoneyError::Malformed(s.to_owned()))?;

        Ok(Money::rounded(value))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;

        Ok(Money::rounded(value))
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
