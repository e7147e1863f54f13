//! # Money Module
//!
//! Provides the `Money` type for sale line math.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Prices arrive from the store as numeric strings ("2.10").             │
//! │  Multiplying parsed floats drifts:                                     │
//! │    2.10 × 3 = 6.300000000000001  ❌                                     │
//! │                                                                         │
//! │  OUR SOLUTION: parse once into integer cents                            │
//! │    "2.10" → 210 cents × 3 = 630 cents → "6.30"                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bigmart_core::money::Money;
//!
//! let price = Money::parse("2.10").unwrap();
//! let line_total = price.multiply_quantity(3).unwrap();
//! assert_eq!(line_total.to_decimal_string(), "6.30");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// Product.price ("2.10") ──► Money::parse ──► SaleLine.price
///                                                │
///                            × quantity ─────────┴──► SaleLine.total
///                                                          │
///                            Σ lines ──────────────────────┴──► Sale.totalPrice
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal string such as `"12"`, `"12.5"` or `"-0.99"`.
    ///
    /// Surrounding whitespace is ignored. Digits past the second decimal
    /// place are rounded half away from zero. Returns `None` for anything
    /// that is not a plain decimal number.
    ///
    /// ## Example
    /// ```rust
    /// use bigmart_core::money::Money;
    ///
    /// assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse("0.125").unwrap().cents(), 13);
    /// assert!(Money::parse("12,50").is_none());
    /// assert!(Money::parse("").is_none());
    /// ```
    pub fn parse(input: &str) -> Option<Money> {
        let s = input.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let mut cents: i64 = 0;
        for c in whole.chars() {
            cents = cents.checked_mul(10)?.checked_add(digit(c))?;
        }
        cents = cents.checked_mul(100)?;

        let mut frac = fraction.chars();
        let tenths = frac.next().map(digit).unwrap_or(0);
        let hundredths = frac.next().map(digit).unwrap_or(0);
        let round_up = frac.next().map(digit).unwrap_or(0) >= 5;

        cents = cents.checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

        Some(Money(if negative { -cents } else { cents }))
    }

    /// Multiplies money by a quantity. Returns `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use bigmart_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).unwrap().cents(), 897);
    /// assert!(unit_price.multiply_quantity(i64::MAX).is_none());
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts. Returns `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, returning `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Formats as a plain two-decimal string, the way totals are stored.
    ///
    /// ## Example
    /// ```rust
    /// use bigmart_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(750).to_decimal_string(), "7.50");
    /// assert_eq!(Money::from_cents(-5).to_decimal_string(), "-0.05");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

fn digit(c: char) -> i64 {
    i64::from(c.to_digit(10).unwrap_or(0))
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Operators saturate instead of panicking; use the checked methods where an
// overflow must be reported.

/// Display shows the amount with a dollar sign (for notifications and logs).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self.to_decimal_string();
        match plain.strip_prefix('-') {
            Some(rest) => write!(f, "-${}", rest),
            None => write!(f, "${}", plain),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse("12.05").unwrap().cents(), 1205);
        assert_eq!(Money::parse(" 0.99 ").unwrap().cents(), 99);
        assert_eq!(Money::parse(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse("-1.25").unwrap().cents(), -125);
    }

    #[test]
    fn test_parse_rounds_third_decimal() {
        assert_eq!(Money::parse("0.125").unwrap().cents(), 13);
        assert_eq!(Money::parse("0.124").unwrap().cents(), 12);
        assert_eq!(Money::parse("1.999").unwrap().cents(), 200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_none());
        assert!(Money::parse(".").is_none());
        assert!(Money::parse("abc").is_none());
        assert!(Money::parse("1.2.3").is_none());
        assert!(Money::parse("12,50").is_none());
        assert!(Money::parse("99999999999999999999").is_none());
    }

    #[test]
    fn test_decimal_string_and_display() {
        assert_eq!(Money::from_cents(630).to_decimal_string(), "6.30");
        assert_eq!(Money::from_cents(0).to_decimal_string(), "0.00");
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
    }

    #[test]
    fn test_line_math_has_no_float_drift() {
        let price = Money::parse("2.10").unwrap();
        let total: Money = [price * 3, Money::parse("0.10").unwrap()].into_iter().sum();
        assert_eq!(total.to_decimal_string(), "6.40");
    }

    #[test]
    fn test_overflow_is_reported_or_saturated() {
        let price = Money::from_cents(210);
        assert!(price.multiply_quantity(i64::MAX).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(price).is_none());
        assert!(Money::checked_sum([Money::from_cents(i64::MAX), price]).is_none());
        assert_eq!(
            Money::checked_sum([price, price]),
            Some(Money::from_cents(420))
        );

        assert_eq!((price * i64::MAX).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MAX) + price).cents(), i64::MAX);
    }
}
