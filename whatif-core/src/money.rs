//! Currencies that appear on statements and the exchanges we price against.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "ILS")]
    Ils,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Ils, Currency::Usd, Currency::Eur, Currency::Gbp];

    pub fn symbol(&self) -> char {
        match self {
            Currency::Ils => '₪',
            Currency::Usd => '$',
            Currency::Eur => '€',
            Currency::Gbp => '£',
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ils => "ILS",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub fn from_symbol(c: char) -> Option<Currency> {
        Currency::ALL.into_iter().find(|cur| cur.symbol() == c)
    }

    /// True if `c` is any statement currency symbol.
    pub fn is_symbol(c: char) -> bool {
        Currency::from_symbol(c).is_some()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = String;

    /// Accepts an ISO code ("ILS", case-insensitive) or the bare symbol ("₪").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(cur) = Currency::from_symbol(c) {
                return Ok(cur);
            }
        }
        Currency::ALL
            .into_iter()
            .find(|cur| cur.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown currency: {s}"))
    }
}

/// An amount in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_from_symbol_and_code() {
        assert_eq!(Currency::from_symbol('₪'), Some(Currency::Ils));
        assert_eq!(Currency::from_symbol('x'), None);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("€".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_money_display() {
        let m = Money::new(dec!(45.9), Currency::Ils);
        assert_eq!(m.to_string(), "₪45.90");
    }

    #[test]
    fn test_currency_serde_uses_codes() {
        let json = serde_json::to_string(&Currency::Gbp).unwrap();
        assert_eq!(json, "\"GBP\"");
    }
}
