//! Currency conversion rates.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use whatif_core::Currency;

pub trait RateSource {
    /// Units of `to` for one unit of `from`; `None` when no rate is known.
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal>;

    fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        self.rate(from, to).map(|r| amount * r)
    }
}

/// Fixed table of USD values per currency unit. Not a live FX feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedRates {
    pub ils: Decimal,
    pub eur: Decimal,
    pub gbp: Decimal,
}

impl Default for FixedRates {
    fn default() -> Self {
        Self {
            ils: dec!(0.27),
            eur: dec!(1.08),
            gbp: dec!(1.27),
        }
    }
}

impl FixedRates {
    fn usd_value(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => Decimal::ONE,
            Currency::Ils => self.ils,
            Currency::Eur => self.eur,
            Currency::Gbp => self.gbp,
        }
    }
}

impl RateSource for FixedRates {
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        let target = self.usd_value(to);
        if target.is_zero() {
            return None;
        }
        let source = self.usd_value(from);
        if source.is_zero() {
            return None;
        }
        Some(source / target)
    }
}
