//! Amounts of money as whole cents.
//!
//! The mobile app speaks decimals (`"pricePerDay": 19.99`). Those are turned
//! into cents once, on the way in (see [`decimal`]), so `19.99 * 3` is
//! `1999 * 3 = 5997` and never `59.970000000000006`.
//!
//! ## Usage
//! ```rust
//! use rentwell_core::money::Money;
//!
//! let daily = Money::from_cents(2500); // $25.00
//! let total = daily.multiply_days(3);  // $75.00
//! assert_eq!(total.cents(), 7500);
//!
//! let parsed = Money::parse_decimal("25.00").unwrap();
//! assert_eq!(parsed, daily);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Where Money is Used
/// ```text
/// Item.price_daily ──► Quote (days × rate) ──► Rental.total_price
///                                                   │
///                                                   └──► snapshotted at
///                                                        creation, never
///                                                        recomputed later
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use rentwell_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
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

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a daily rate by a number of days.
    ///
    /// Saturates instead of overflowing; validation rejects such totals
    /// long before they could be persisted.
    ///
    /// ## Example
    /// ```rust
    /// use rentwell_core::money::Money;
    ///
    /// let daily = Money::from_cents(1999);
    /// assert_eq!(daily.multiply_days(3).cents(), 5997);
    /// ```
    #[inline]
    pub const fn multiply_days(&self, days: i64) -> Self {
        Money(self.0.saturating_mul(days))
    }

    /// Parses a decimal string such as `"25"`, `"25.5"` or `"25.00"`.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two fractional digits (no silent rounding of strings)
    ///
    /// ## Example
    /// ```rust
    /// use rentwell_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("10.99").unwrap().cents(), 1099);
    /// assert_eq!(Money::parse_decimal("7.5").unwrap().cents(), 750);
    /// assert!(Money::parse_decimal("1.999").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("empty amount"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }
        if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount is too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Formats as a plain decimal string without currency sign (`"25.00"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable display. Use front-end formatting for localized output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter for decimal amounts on the JSON wire.
///
/// The mobile app speaks decimals (`"pricePerDay": 25.0`); everything behind
/// the handlers speaks cents. This module is the only place where a float is
/// turned into [`Money`].
///
/// ## Usage
/// ```rust
/// use rentwell_core::money::{self, Money};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Body {
///     #[serde(with = "money::decimal")]
///     price: Money,
/// }
///
/// let body: Body = serde_json::from_str(r#"{"price": 19.99}"#).unwrap();
/// assert_eq!(body.price.cents(), 1999);
///
/// let body: Body = serde_json::from_str(r#"{"price": "19.99"}"#).unwrap();
/// assert_eq!(body.price.cents(), 1999);
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    /// Serializes cents as a decimal JSON number (`2500` → `25.0`).
    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.cents() as f64 / 100.0)
    }

    /// Deserializes a JSON number or decimal string into cents.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            v.checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount is too large"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            i64::try_from(v)
                .map_err(|_| E::custom("amount is too large"))
                .and_then(|v| self.visit_i64(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            let cents = (v * 100.0).round();
            if !cents.is_finite() || cents.abs() > i64::MAX as f64 {
                return Err(E::custom("amount is not a finite number"));
            }
            Ok(Money::from_cents(cents as i64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse_decimal(v).map_err(E::custom)
        }
    }

    /// Same as the parent module, for optional amounts (`null` → `None`).
    pub mod option {
        use super::super::Money;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        #[derive(Serialize, Deserialize)]
        struct Wrapped(#[serde(with = "crate::money::decimal")] Money);

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.map(Wrapped).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Money::default(), Money::zero());
        assert!(Money::default().is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(Money::from_cents(7500).to_decimal_string(), "75.00");
    }

    #[test]
    fn test_multiply_days() {
        assert_eq!(Money::from_cents(2500).multiply_days(3).cents(), 7500);
        assert_eq!(
            Money::from_cents(i64::MAX).multiply_days(2).cents(),
            i64::MAX
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("25").unwrap().cents(), 2500);
        assert_eq!(Money::parse_decimal("25.5").unwrap().cents(), 2550);
        assert_eq!(Money::parse_decimal("0.01").unwrap().cents(), 1);
        assert_eq!(Money::parse_decimal(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse_decimal("-3.10").unwrap().cents(), -310);

        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.234").is_err());
        assert!(Money::parse_decimal("1,50").is_err());
    }

    #[derive(Serialize, Deserialize)]
    struct Wire {
        #[serde(with = "decimal")]
        amount: Money,
    }

    #[test]
    fn test_decimal_wire_format() {
        let wire: Wire = serde_json::from_str(r#"{"amount": 59.97}"#).unwrap();
        assert_eq!(wire.amount.cents(), 5997);

        let wire: Wire = serde_json::from_str(r#"{"amount": 75}"#).unwrap();
        assert_eq!(wire.amount.cents(), 7500);

        let json = serde_json::to_value(Wire {
            amount: Money::from_cents(2500),
        })
        .unwrap();
        assert_eq!(json["amount"], serde_json::json!(25.0));

        assert!(serde_json::from_str::<Wire>(r#"{"amount": true}"#).is_err());
    }
}
