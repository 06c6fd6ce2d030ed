//! # Monetary Value Types
//!
//! Currency-tagged amounts in integer minor units. Amounts are immutable
//! after construction and never negative, so no provider conversion can
//! introduce rounding surprises.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    COP,
    USD,
    EUR,
    MXN,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::COP => "COP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::MXN => "MXN",
        }
    }

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u8 {
        // All currently supported currencies use 2
        2
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::COP
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable monetary amount in smallest currency unit (centavos, cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    minor: i64,
    currency: Currency,
}

impl Amount {
    /// Create an amount from minor units. Negative amounts are rejected.
    pub fn from_minor(minor: i64, currency: Currency) -> PaymentResult<Self> {
        if minor < 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "amount must be non-negative, got {} {}",
                minor, currency
            )));
        }
        Ok(Self { minor, currency })
    }

    /// Amount in smallest currency unit
    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Decimal amount in major units (e.g. 50000 minor COP -> 500.00)
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.minor, self.currency.decimal_places() as u32)
    }

    /// Format for display (e.g. "500.00 COP")
    pub fn display(&self) -> String {
        format!("{} {}", self.as_decimal(), self.currency)
    }
}
