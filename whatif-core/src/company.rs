//! Reference companies and the result of matching a merchant against them.

use serde::{Deserialize, Serialize};

use crate::money::Currency;
use crate::script;
use crate::statement::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Nasdaq,
    Nyse,
    Tase,
    Lse,
    Xetra,
}

impl Exchange {
    /// Currency the venue quotes in.
    pub fn pricing_currency(&self) -> Currency {
        match self {
            Exchange::Nasdaq | Exchange::Nyse => Currency::Usd,
            Exchange::Tase => Currency::Ils,
            Exchange::Lse => Currency::Gbp,
            Exchange::Xetra => Currency::Eur,
        }
    }

    /// Suffix Yahoo-style quote symbols carry for this venue.
    pub fn quote_suffix(&self) -> &'static str {
        match self {
            Exchange::Nasdaq | Exchange::Nyse => "",
            Exchange::Tase => ".TA",
            Exchange::Lse => ".L",
            Exchange::Xetra => ".DE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(rename = "name")]
    pub canonical_name: String,
    pub ticker: String,
    pub exchange: Exchange,
    /// Brand variants, transliterations and ticker spellings, in priority order.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CompanyRecord {
    pub fn new(
        canonical_name: impl Into<String>,
        ticker: impl Into<String>,
        exchange: Exchange,
        aliases: &[&str],
    ) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            ticker: ticker.into(),
            exchange,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Symbol used for price lookups, e.g. `MGDL.TA`.
    pub fn quote_symbol(&self) -> String {
        // Share classes are dotted on listings ("BRK.B") but dashed in quote symbols.
        format!("{}{}", self.ticker.replace('.', "-"), self.exchange.quote_suffix())
    }

    /// Canonical name is written in Latin script.
    pub fn is_latin(&self) -> bool {
        script::has_latin(&self.canonical_name) && !script::has_hebrew(&self.canonical_name)
    }
}

/// Confidence tier, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    Exact,
    Alias,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub transaction: Transaction,
    pub company: CompanyRecord,
    pub match_confidence: MatchConfidence,
    /// Similarity on a 0-100 scale, recorded for fuzzy matches only.
    pub match_score: Option<u8>,
}
