//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    25.00 × 5% = 1.2500000000000002                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    2500 cents × 500 bps = 125 cents, exactly                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medflow_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! let parsed = Money::parse("10.5").unwrap();
//! assert_eq!(parsed.cents(), 1050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ```text
/// Item.price_cents ──► TransactionLineItem ──► Cart.subtotal
///                                                   │
///                                       calculate_tax(5%)
///                                                   │
///                                                   ▼
///                                           Transaction.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Calculates tax on this amount, rounding half up.
    ///
    /// Integer math: `(amount * bps + 5000) / 10000`.
    ///
    /// ```rust
    /// use medflow_core::money::Money;
    /// use medflow_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(2500);
    /// assert_eq!(subtotal.calculate_tax(TaxRate::from_bps(500)).cents(), 125);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large ledgers from overflowing
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a decimal amount such as `"12"`, `"12.5"` or `"12.50"`.
    ///
    /// More than two fractional digits, signs and non-digit characters are
    /// rejected. Used by the command line where prices are typed by hand.
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        let input = input.trim().trim_start_matches('$');
        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "price".to_string(),
            });
        }

        let (major, minor) = match input.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (input, ""),
        };

        if minor.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !minor.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a number like 12.50"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("bad cents"))? * 10,
            _ => minor.parse().map_err(|_| invalid("bad cents"))?,
        };

        major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("amount too large"))
    }
}

// =============================================================================
// Decimal Wire Format
// =============================================================================

/// Serde adapter for cent fields that travel as decimal amounts.
///
/// Stored, pushed and backed-up documents carry prices and totals as plain
/// numbers with two decimals (`12.5`, `26.25`). Inside the program they stay
/// integer cents.
///
/// ```rust
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Line {
///     #[serde(with = "medflow_core::money::decimal")]
///     price: i64,
/// }
///
/// let line: Line = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
/// assert_eq!(line.price, 1250);
/// assert_eq!(serde_json::to_string(&line).unwrap(), r#"{"price":12.5}"#);
/// ```
pub mod decimal {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*cents as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        to_cents(amount).ok_or_else(|| D::Error::custom(format!("invalid amount {}", amount)))
    }

    /// Same as [`deserialize`] for fields that may be absent or `null`.
    pub fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(amount) => to_cents(amount)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid amount {}", amount))),
            None => Ok(None),
        }
    }

    fn to_cents(amount: f64) -> Option<i64> {
        let cents = (amount * 100.0).round();
        // i64::MAX is not exactly representable; stay well inside it
        if cents.is_finite() && cents.abs() < 9.0e15 {
            Some(cents as i64)
        } else {
            None
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
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
    fn test_display() {
        assert_eq!(Money::from_cents(2625).to_string(), "$26.25");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    }

    #[test]
    fn test_tax_at_five_percent() {
        let rate = TaxRate::from_bps(500);
        assert_eq!(Money::from_cents(2500).calculate_tax(rate).cents(), 125);
        // $0.10 × 5% = 0.5 cents → rounds up
        assert_eq!(Money::from_cents(10).calculate_tax(rate).cents(), 1);
        assert_eq!(Money::from_cents(9).calculate_tax(rate).cents(), 0);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 5].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 355);
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Priced {
        #[serde(with = "decimal")]
        price: i64,
    }

    #[test]
    fn test_decimal_wire_format() {
        let json = serde_json::to_value(Priced { price: 2625 }).unwrap();
        assert_eq!(json["price"], 26.25);

        let p: Priced = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(p.price, 1250);
        // integers and float noise both land on whole cents
        let p: Priced = serde_json::from_str(r#"{"price": 40}"#).unwrap();
        assert_eq!(p.price, 4000);
        let p: Priced = serde_json::from_str(r#"{"price": 0.30000000000000004}"#).unwrap();
        assert_eq!(p.price, 30);

        assert!(serde_json::from_str::<Priced>(r#"{"price": 1e300}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"price": "12.5"}"#).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse("$0.99").unwrap().cents(), 99);
        assert_eq!(Money::parse(".75").unwrap().cents(), 75);

        assert!(Money::parse("").is_err());
        assert!(Money::parse("-1").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("abc").is_err());
    }
}
