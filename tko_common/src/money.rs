use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_SYMBOL: &str = "¥";

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in integer cents. All prices and order totals in the system are `Money`,
/// which keeps arithmetic exact and maps onto a single INTEGER column.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as Money: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{CURRENCY_SYMBOL}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in whole currency units, e.g. `Money::from_cents(1250).whole_units() == 12`.
    pub fn whole_units(&self) -> i64 {
        self.0 / 100
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn money_arithmetic() {
        let a = Money::from_cents(500);
        let b = Money::from_cents(250);
        assert_eq!(a + b, Money::from_cents(750));
        assert_eq!(a - b, Money::from_cents(250));
        assert_eq!(a * 3, Money::from_cents(1500));
        assert_eq!(-a, Money::from_cents(-500));
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total, Money::from_cents(1000));
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1250).to_string(), "¥12.50");
        assert_eq!(Money::from_cents(5).to_string(), "¥0.05");
        assert_eq!(Money::from_cents(-310).to_string(), "-¥3.10");
    }
}
