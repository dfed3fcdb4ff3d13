//! Outcome of the hypothetical "invested instead" calculation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::company::MatchResult;
use crate::money::{Currency, Money};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(rename = "match")]
    pub matched: MatchResult,
    /// First trading day at or after the purchase date.
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    /// Purchase amount in the exchange's pricing currency.
    pub invested: Money,
    pub percent_change: Decimal,
    pub value_change: Decimal,
}

impl PerformanceRecord {
    pub fn is_gain(&self) -> bool {
        self.value_change > Decimal::ZERO
    }
}

/// Why a single transaction has no performance figure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Unavailable {
    #[error("transaction date {0} is in the future")]
    FutureDate(NaiveDate),
    #[error("no price history on or after the transaction date")]
    NoPriceHistory,
    #[error("no current price")]
    NoCurrentPrice,
    #[error("price lookup failed: {0}")]
    LookupFailed(String),
    #[error("no conversion rate from {from:?} to {to:?}")]
    NoConversionRate { from: Currency, to: Currency },
    #[error("entry price is zero")]
    ZeroEntryPrice,
}
