//! Non-negative monetary amounts with two decimal places.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Fractional digits kept for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Total digits allowed for an amount (integral + fractional).
pub const MONEY_MAX_DIGITS: u32 = 12;

/// A non-negative amount of money, always held at scale 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::new(0, MONEY_SCALE))
    }

    /// Validate and normalise an amount.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation("amount must not be negative"));
        }
        let normalized = value.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(DomainError::validation(format!(
                "amount must have at most {MONEY_SCALE} decimal places"
            )));
        }
        let limit = Decimal::from(10_i64.pow(MONEY_MAX_DIGITS - MONEY_SCALE));
        if normalized >= limit {
            return Err(DomainError::validation(format!(
                "amount must have at most {} digits before the decimal point",
                MONEY_MAX_DIGITS - MONEY_SCALE
            )));
        }
        let mut amount = normalized.abs();
        amount.rescale(MONEY_SCALE);
        Ok(Self(amount))
    }

    /// Like [`Money::new`], reporting failures against a named input field.
    pub fn for_field(field: &str, value: Decimal) -> DomainResult<Self> {
        Self::new(value).map_err(|e| match e {
            DomainError::Validation(msg) => DomainError::field(field, msg),
            other => other,
        })
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Return on spend: `self / spend`, zero when nothing was spent.
    pub fn return_on(&self, spend: Money) -> f64 {
        ratio(self.0, spend.0).to_f64().unwrap_or(0.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Sum a sequence of amounts without the per-value digit limit.
pub fn total<'a>(amounts: impl IntoIterator<Item = &'a Money>) -> Decimal {
    let mut sum = Decimal::new(0, MONEY_SCALE);
    for m in amounts {
        sum += m.0;
    }
    sum
}

/// `numerator / denominator`, defined as zero when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}
