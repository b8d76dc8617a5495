//! Monetary amounts using decimal arithmetic.
//!
//! The backend sends totals and prices as plain JSON numbers (or numeric
//! strings when they come straight out of a `NUMERIC` column). Deserialization
//! accepts both; request payloads use [`rust_decimal::serde::float`] so they go
//! out as numbers.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the shop's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from whole currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

/// Format an amount with two decimals and comma thousands separators.
///
/// ```
/// use pedalhub_core::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(125_000_050, 2)), "1,250,000.50");
/// assert_eq!(format_amount(Decimal::new(-999, 1)), "-99.90");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}.{fraction}")
    } else {
        format!("{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_deserializes_from_number_and_string() {
        let from_number: Money = serde_json::from_str("1500000").unwrap_or_default();
        let from_string: Money = serde_json::from_str("\"1500000.00\"").unwrap_or_default();
        assert_eq!(from_number, Money::from_units(1_500_000));
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_money_times_quantity() {
        let unit = Money::new(Decimal::new(1999, 2));
        assert_eq!(unit * 3, Money::new(Decimal::new(5997, 2)));
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_units(10), Money::from_units(5)].into_iter().sum();
        assert_eq!(total, Money::from_units(15));
    }

    #[test]
    fn test_format_amount_small_values() {
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(999, 0)), "999.00");
        assert_eq!(format_amount(Decimal::new(1000, 0)), "1,000.00");
    }
}
