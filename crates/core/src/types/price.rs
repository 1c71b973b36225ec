//! Decimal prices.
//!
//! Supabase stores prices as `numeric`; PostgREST returns them as JSON
//! numbers or strings depending on precision, so [`Price`] deserializes from
//! either via `rust_decimal`'s string-tolerant serde support.

use std::fmt;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }
}

/// A monetary amount in a currency's standard unit (rupees, not paise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Price {
    pub amount: Decimal,
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A rupee price from an amount in paise.
    #[must_use]
    pub fn from_paise(paise: i64) -> Self {
        Self::new(Decimal::new(paise, 2), CurrencyCode::INR)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

// Mixed-currency arithmetic never happens in a single cart; the left-hand
// currency wins.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise_and_display() {
        assert_eq!(Price::from_paise(4950).to_string(), "₹49.50");
    }

    #[test]
    fn test_line_arithmetic() {
        let total = Price::from_paise(2500) * 3 + Price::from_paise(1000);
        assert_eq!(total, Price::from_paise(8500));
    }

    #[test]
    fn test_deserializes_string_amounts() {
        let price: Price = serde_json::from_str(r#"{"amount":"12.40"}"#).unwrap();
        assert_eq!(price, Price::from_paise(1240));
    }
}
