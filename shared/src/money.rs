//! Fixed-point money type
//!
//! Amounts are `rust_decimal::Decimal` values with two decimal places,
//! serialized as JSON numbers and stored as integer cents.

use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Decimal places kept for every amount
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price (1,000,000.00)
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);

/// Money conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount has more than {DECIMAL_PLACES} decimal places: {0}")]
    TooPrecise(Decimal),

    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// A monetary amount with exactly two decimal places
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Build from a decimal, rejecting values with sub-cent precision
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.round_dp(DECIMAL_PLACES) != value {
            return Err(MoneyError::TooPrecise(value));
        }
        Ok(Self::round(value))
    }

    /// Build from a decimal, rounding half-up to two places
    pub fn round(value: Decimal) -> Self {
        let mut d =
            value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        d.rescale(DECIMAL_PLACES);
        Money(d)
    }

    /// Build from integer cents
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DECIMAL_PLACES))
    }

    /// Integer cents representation used for storage
    pub fn cents(&self) -> Result<i64, MoneyError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .ok_or(MoneyError::OutOfRange(self.0))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Line subtotal: unit price times quantity, exact
    pub fn times(&self, quantity: i64) -> Money {
        Money::round(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "db")]
mod db {
    use super::Money;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
    use sqlx::{Decode, Encode, Type};

    impl Type<Sqlite> for Money {
        fn type_info() -> SqliteTypeInfo {
            <i64 as Type<Sqlite>>::type_info()
        }

        fn compatible(ty: &SqliteTypeInfo) -> bool {
            <i64 as Type<Sqlite>>::compatible(ty)
        }
    }

    impl<'q> Encode<'q, Sqlite> for Money {
        fn encode_by_ref(
            &self,
            buf: &mut Vec<SqliteArgumentValue<'q>>,
        ) -> Result<IsNull, BoxDynError> {
            let cents = self.cents()?;
            <i64 as Encode<'q, Sqlite>>::encode_by_ref(&cents, buf)
        }
    }

    impl<'r> Decode<'r, Sqlite> for Money {
        fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
            let cents = <i64 as Decode<'r, Sqlite>>::decode(value)?;
            Ok(Money::from_cents(cents))
        }
    }
}
