use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::DateError;

/// Classification of one normalized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    HeaderFooter,
    TransactionCandidate,
    Noise,
}

/// Why a transaction candidate was dropped. Never fatal to the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line matches no known statement layout")]
    NoShape,
    #[error("amount is not a non-negative decimal: {0:?}")]
    BadAmount(String),
    #[error("merchant description is empty")]
    EmptyMerchant,
    #[error("bad date: {0}")]
    BadDate(#[from] DateError),
}
