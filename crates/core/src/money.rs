//! Monetary amounts in minor units (cents).
//!
//! Amounts are stored as integer cents so that sums over order lines are exact.
//! Conversion from decimal input rounds half-up to two decimals, matching the
//! catalog price rule. On the wire an amount is a plain JSON number
//! (`12.5`), never a string.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Round a decimal value half-up to 2 decimal places.
///
/// `round2(2.675)` is subject to binary representation like any `f64`
/// arithmetic; use `Money` for exact amounts.
pub fn round2(value: f64) -> f64 {
    ((value * 100.0) + 0.5).floor() / 100.0
}

/// A monetary amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a major-unit amount (e.g. `12.345`) rounding half-up to cents.
    pub fn from_major(value: f64) -> Self {
        Self(((value * 100.0) + 0.5).floor() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Line amount: `self × quantity`.
    pub fn checked_mul(self, quantity: u64) -> Option<Money> {
        i64::try_from(quantity)
            .ok()
            .and_then(|q| self.0.checked_mul(q))
            .map(Money)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a decimal string exactly, rounding the third decimal half-up
    /// (on the magnitude).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation("amount", format!("'{s}' is not a valid amount"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().is_some_and(|d| d >= 5);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        Ok(Money::from_major(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_rounds_half_up() {
        assert_eq!(Money::from_major(12.345).cents(), 1235);
        assert_eq!(Money::from_major(12.344).cents(), 1234);
        assert_eq!(Money::from_major(0.0).cents(), 0);
        assert_eq!(Money::from_major(99.999).cents(), 10000);
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!("1.005".parse::<Money>().unwrap().cents(), 101);
        assert_eq!("1.004".parse::<Money>().unwrap().cents(), 100);
        assert_eq!("42".parse::<Money>().unwrap().cents(), 4200);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_cents(1205).to_string(), "12.05");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }

    #[test]
    fn serde_uses_json_numbers() {
        let json = serde_json::to_value(Money::from_cents(1250)).unwrap();
        assert_eq!(json, serde_json::json!(12.5));

        let m: Money = serde_json::from_value(serde_json::json!(12.345)).unwrap();
        assert_eq!(m.cents(), 1235);
        let m: Money = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(m.cents(), 700);
        let m: Money = serde_json::from_value(serde_json::json!("3.99")).unwrap();
        assert_eq!(m.cents(), 399);
    }

    #[test]
    fn checked_mul_multiplies_by_quantity() {
        assert_eq!(Money::from_cents(250).checked_mul(4), Some(Money::from_cents(1000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn round2_matches_half_up() {
        assert_eq!(round2(10.125), 10.13);
        assert_eq!(round2(3.0), 3.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: parsing the display form of any amount gives it back.
            #[test]
            fn display_parse_identity(cents in -1_000_000_000i64..1_000_000_000i64) {
                let m = Money::from_cents(cents);
                prop_assert_eq!(m.to_string().parse::<Money>().unwrap(), m);
            }

            /// Property: sums of cents never drift (exact arithmetic).
            #[test]
            fn sum_is_exact(values in proptest::collection::vec(0i64..1_000_000, 0..50)) {
                let total: Money = values.iter().copied().map(Money::from_cents).sum();
                prop_assert_eq!(total.cents(), values.iter().sum::<i64>());
            }
        }
    }
}
