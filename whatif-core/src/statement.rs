//! Statement-level records produced by extraction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{Currency, Money};

/// Plain text of one PDF page, as handed over by the page decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub index: usize,
    pub text: String,
}

impl RawPage {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Statement layout variant, in the order the parser tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// `amount amount [type] description date`
    #[serde(rename = "dual-column")]
    DualColumn,
    /// `date description currency amount`
    #[serde(rename = "single-column")]
    SingleColumn,
    /// `date description amount currency`
    #[serde(rename = "single-column-trailing-symbol")]
    SingleColumnTrailingSymbol,
}

impl Dialect {
    pub const PRIORITY: [Dialect; 3] = [
        Dialect::DualColumn,
        Dialect::SingleColumn,
        Dialect::SingleColumnTrailingSymbol,
    ];
}

/// One purchase line from a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub merchant_text: String,
    /// Charged amount. Non-negative; refunds are not modelled.
    pub amount: Decimal,
    pub currency: Currency,
    pub has_latin_script: bool,
    /// Original-currency amount from the second column of dual-column statements.
    pub original: Option<Money>,
    /// Transaction-type column ("רגילה", "תשלומים", ...) when present.
    pub kind: Option<String>,
    pub dialect: Dialect,
    pub page: usize,
    /// Day and month could be swapped without producing an invalid date.
    pub date_ambiguous: bool,
}

impl Transaction {
    pub fn charged(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}
