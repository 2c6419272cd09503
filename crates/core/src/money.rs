//! Fixed-point money value object.
//!
//! Amounts are held as an integer count of the currency's minor unit (cents).
//! Binary floating point never touches a price.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// ISO 4217 currencies the storefront prices in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    /// ISO currency code (e.g. "EUR").
    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
        }
    }

    /// Number of minor units per major unit, as a power of ten.
    pub fn minor_digits(self) -> u32 {
        2
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            other => Err(DomainError::validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// Arithmetic failure on [`Money`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("amount overflow")]
    Overflow,
}

/// An amount of money in a single currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor_units: i64,
    currency: Currency,
}

impl ValueObject for Money {}

impl Money {
    pub fn new(minor_units: i64, currency: Currency) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn minor_units(&self) -> i64 {
        self.minor_units
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        let minor_units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(minor_units, self.currency))
    }

    /// Multiply by a quantity (line total = unit price × quantity).
    pub fn checked_mul(self, quantity: u32) -> Result<Money, MoneyError> {
        let minor_units = self
            .minor_units
            .checked_mul(i64::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(minor_units, self.currency))
    }

    /// Saturating variant of [`Money::checked_mul`] for callers that already
    /// proved the product fits.
    pub fn saturating_mul(self, quantity: u32) -> Money {
        Self::new(
            self.minor_units.saturating_mul(i64::from(quantity)),
            self.currency,
        )
    }

    /// Split into `(is_negative, major, minor)` for rendering.
    pub fn parts(&self) -> (bool, u64, u64) {
        let scale = 10u64.pow(self.currency.minor_digits());
        let abs = self.minor_units.unsigned_abs();
        (self.minor_units < 0, abs / scale, abs % scale)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (negative, major, minor) = self.parts();
        let sign = if negative { "-" } else { "" };
        let width = self.currency.minor_digits() as usize;
        write!(f, "{sign}{major}.{minor:0width$} {}", self.currency)
    }
}
