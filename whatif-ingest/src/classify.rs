//! Line classification: boilerplate first, then the currency + date anchor.

use anyhow::Result;
use regex::Regex;
use whatif_core::Currency;

use crate::parser::DATE;
use crate::types::LineKind;

pub struct LineClassifier {
    boilerplate: Vec<String>,
    date_re: Regex,
}

impl LineClassifier {
    /// `boilerplate` holds statement-specific section titles and footer tokens.
    pub fn new(boilerplate: &[String]) -> Result<Self> {
        Ok(Self {
            boilerplate: boilerplate
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            date_re: Regex::new(&format!(r"(?:^|[^\d])(?:{DATE})(?:[^\d]|$)"))?,
        })
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let lower = line.to_lowercase();
        if self.boilerplate.iter().any(|token| lower.contains(token.as_str())) {
            return LineKind::HeaderFooter;
        }
        if line.chars().any(Currency::is_symbol) && self.date_re.is_match(line) {
            return LineKind::TransactionCandidate;
        }
        LineKind::Noise
    }
}
