//! Type-safe price representation using decimal arithmetic.
//!
//! All prices in the marketplace are Indian rupees. The document store keeps
//! them as plain JSON numbers, so [`Price`] serializes as a number and accepts
//! either a number or a numeric string when deserializing.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("price must be a number")]
    NotANumber,
    #[error("price cannot be negative")]
    Negative,
    #[error("price must be greater than zero")]
    NotPositive,
}

/// A non-negative rupee amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Currency symbol used for display.
    pub const SYMBOL: &'static str = "₹";

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a price typed into a form. The amount must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] when the input is empty, not numeric, or not
    /// greater than zero.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim().trim_start_matches(Self::SYMBOL).trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount: Decimal = trimmed.parse().map_err(|_| PriceError::NotANumber)?;
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount as a float, for storage in the document store.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Multiply by a quantity, saturating at the largest representable amount.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Format with the rupee symbol and Indian digit grouping, e.g. `₹1,23,456.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = format!("{:.2}", self.0.round_dp(2));
        let (whole, fraction) = rounded.split_once('.').unwrap_or((&rounded, "00"));
        format!("{}{}.{fraction}", Self::SYMBOL, group_indian(whole))
    }
}

/// Group digits the way `en-IN` does: the last three together, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Saturates at the largest representable amount.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        let amount = match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Decimal::from(value),
            Raw::Float(value) => Decimal::from_f64(value)
                .ok_or_else(|| serde::de::Error::custom(PriceError::NotANumber))?,
            Raw::Text(value) => value
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(PriceError::NotANumber))?,
        };
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_input() {
        assert_eq!(Price::parse("249.50").unwrap().amount(), Decimal::new(24950, 2));
        assert_eq!(Price::parse(" ₹ 80 ").unwrap().amount(), Decimal::from(80));
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-5"), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_display_uses_indian_grouping() {
        assert_eq!(Price::new(Decimal::from(799)).unwrap().display(), "₹799.00");
        assert_eq!(Price::new(Decimal::from(1299)).unwrap().display(), "₹1,299.00");
        assert_eq!(
            Price::new(Decimal::new(12_345_650, 2)).unwrap().display(),
            "₹1,23,456.50"
        );
        assert_eq!(
            Price::new(Decimal::from(10_000_000)).unwrap().display(),
            "₹1,00,00,000.00"
        );
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let from_int: Price = serde_json::from_str("120").unwrap();
        let from_float: Price = serde_json::from_str("120.5").unwrap();
        let from_text: Price = serde_json::from_str("\"120.5\"").unwrap();
        assert_eq!(from_int.amount(), Decimal::from(120));
        assert_eq!(from_float, from_text);
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::parse("99.5").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "99.5");
    }

    #[test]
    fn test_sum_and_times() {
        let a = Price::parse("10").unwrap();
        let b = Price::parse("2.5").unwrap();
        let total: Price = [a.times(3), b.times(2)].into_iter().sum();
        assert_eq!(total.amount(), Decimal::from(35));
    }

    #[test]
    fn test_overflow_saturates() {
        let huge: Price = serde_json::from_str("\"70000000000000000000000000000\"").unwrap();
        assert_eq!(huge.times(2).amount(), Decimal::MAX);
        let total: Price = [huge, huge, Price::parse("1").unwrap()].into_iter().sum();
        assert_eq!(total.amount(), Decimal::MAX);
    }
}
