//! Calendar periods used by the dashboard records.

use core::fmt;

use serde::{Deserialize, Serialize};

use v4vision_core::{DomainError, DomainResult, ValueObject};

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Calendar month, 1 (January) through 12.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl ValueObject for Month {}

impl Month {
    pub fn new(number: u8) -> DomainResult<Self> {
        if (1..=12).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DomainError::field("mes", format!("{number} is not a valid month (1-12)")))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Display name, e.g. `Março`.
    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for Month {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Month> for u8 {
    fn from(value: Month) -> Self {
        value.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Week within a month, 1 through 5.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Week(u8);

impl ValueObject for Week {}

impl Week {
    pub fn new(number: u8) -> DomainResult<Self> {
        if (1..=5).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DomainError::field("semana", format!("{number} is not a valid week (1-5)")))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn name(self) -> String {
        format!("Semana {}", self.0)
    }
}

impl TryFrom<u8> for Week {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Week> for u8 {
    fn from(value: Week) -> Self {
        value.0
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
