//! Money type with fixed two-digit decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and keeps every value at a scale of
//! exactly two fractional digits (cents). Division and multiplication round
//! toward zero; callers are responsible for placing the remainder.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a [`Money`] value from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("not a valid monetary amount: {0}")]
    Invalid(String),

    /// The input carries sub-cent precision.
    #[error("amount {0} has more than {scale} decimal places", scale = Money::SCALE)]
    TooManyDecimals(String),

    /// The input is too large to carry two decimal places.
    #[error("amount {0} is out of range")]
    OutOfRange(String),
}

/// A monetary amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Number of fractional digits carried by every amount.
    pub const SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// The smallest representable amount (0.01).
    pub const CENT: Self = Self(Decimal::from_parts(1, 0, 0, false, Self::SCALE));

    /// The largest representable amount.
    pub const MAX: Self = Self(Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, Self::SCALE));

    /// Creates a money value from a decimal.
    ///
    /// Trailing zeros beyond the second fractional digit are accepted
    /// (`12.500` is `12.50`); any other sub-cent digit is rejected, as is any
    /// amount above [`Money::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > Self::SCALE {
            return Err(MoneyError::TooManyDecimals(amount.to_string()));
        }
        Self::rescaled(amount).ok_or_else(|| MoneyError::OutOfRange(amount.to_string()))
    }

    /// Creates a money value from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::SCALE))
    }

    /// Creates a money value, truncating sub-cent digits toward zero.
    ///
    /// Returns `None` when the amount is above [`Money::MAX`].
    #[must_use]
    pub fn floor(amount: Decimal) -> Option<Self> {
        Self::rescaled(amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::ToZero))
    }

    // `rescale` leaves a smaller scale in place when two decimals would overflow.
    fn rescaled(mut amount: Decimal) -> Option<Self> {
        amount.rescale(Self::SCALE);
        (amount.scale() == Self::SCALE).then_some(Self(amount))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns true if the amount is strictly above zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Divides into `parts` equal shares, each rounded toward zero to cents.
    ///
    /// Returns `None` when `parts` is zero.
    #[must_use]
    pub fn split_floor(self, parts: usize) -> Option<Self> {
        if parts == 0 {
            return None;
        }
        Self::floor(self.0 / Decimal::from(parts))
    }

    /// Multiplies by a ratio, rounding the product toward zero to cents.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn mul_floor(self, ratio: Decimal) -> Option<Self> {
        self.0.checked_mul(ratio).and_then(Self::floor)
    }

    /// Addition that returns `None` instead of overflowing.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Self::rescaled)
    }

    /// Subtraction that returns `None` instead of overflowing.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).and_then(Self::rescaled)
    }

    /// Sum that returns `None` instead of overflowing.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Multiplies by an integer count. Exact.
    #[must_use]
    pub fn times(self, count: usize) -> Self {
        Self(self.0 * Decimal::from(count))
    }

    /// Returns true if `|self - other| <= tolerance`.
    #[must_use]
    pub fn within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount =
            Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(trimmed.to_string()))?;
        Self::new(amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_new_rescales_to_cents() {
        let money = Money::new(dec!(100)).unwrap();
        assert_eq!(money.amount(), dec!(100.00));
        assert_eq!(money.to_string(), "100.00");
    }

    #[test]
    fn test_money_new_accepts_trailing_zeros() {
        let money = Money::new(dec!(12.500)).unwrap();
        assert_eq!(money.to_string(), "12.50");
    }

    #[test]
    fn test_money_new_rejects_sub_cent() {
        assert!(matches!(
            Money::new(dec!(0.001)),
            Err(MoneyError::TooManyDecimals(_))
        ));
    }

    #[test]
    fn test_money_zero() {
        assert!(Money::ZERO.is_zero());
        assert_eq!(Money::default(), Money::ZERO);
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_money_sign_checks() {
        let positive = Money::from_cents(1000);
        assert!(positive.is_positive());
        assert!(!positive.is_negative());

        let negative = -positive;
        assert!(negative.is_negative());
        assert!(!negative.is_positive());

        assert!(!Money::ZERO.is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn test_split_floor_rounds_toward_zero() {
        let share = Money::from_cents(10_000).split_floor(3).unwrap();
        assert_eq!(share, Money::from_cents(3_333));
    }

    #[test]
    fn test_split_floor_zero_parts() {
        assert!(Money::from_cents(10_000).split_floor(0).is_none());
    }

    #[test]
    fn test_mul_floor_rounds_toward_zero() {
        let amount = Money::from_cents(100).mul_floor(dec!(0.3333));
        assert_eq!(amount, Some(Money::from_cents(33)));
    }

    #[test]
    fn test_mul_floor_overflow() {
        assert_eq!(Money::MAX.mul_floor(dec!(2)), None);
    }

    #[test]
    fn test_money_new_rejects_out_of_range() {
        assert!(matches!(
            Money::new(dec!(50000000000000000000000000000)),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_checked_add_overflow() {
        let half = Money::new(dec!(500000000000000000000000000)).unwrap();
        assert_eq!(half.checked_add(half), None);
        assert_eq!(Money::CENT.checked_add(Money::CENT), Some(Money::from_cents(2)));
    }

    #[test]
    fn test_checked_sum() {
        let items = [Money::from_cents(3_334), Money::from_cents(3_333)];
        assert_eq!(Money::checked_sum(items), Some(Money::from_cents(6_667)));
        assert_eq!(Money::checked_sum([Money::MAX, Money::CENT]), None);
    }

    #[test]
    fn test_within_tolerance() {
        let a = Money::from_cents(10_000);
        assert!(a.within(Money::from_cents(10_001), Money::CENT));
        assert!(a.within(Money::from_cents(9_999), Money::CENT));
        assert!(!a.within(Money::from_cents(10_002), Money::CENT));
    }

    #[test]
    fn test_sum() {
        let items = [Money::from_cents(3_334), Money::from_cents(3_333), Money::from_cents(3_333)];
        assert_eq!(items.iter().sum::<Money>(), Money::from_cents(10_000));
    }
}
