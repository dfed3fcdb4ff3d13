//! Reference data: companies, payment vocabulary and script special cases.
//!
//! Loaded once at start-up and read-only afterwards. The embedded document can be
//! extended with a user file and, best effort, with index-constituent lists.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use whatif_core::CompanyRecord;

use crate::enrich::{IndexSource, enrich_from_indexes};

const EMBEDDED: &str = include_str!("../data/reference.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCase {
    pub fragment: String,
    pub ticker: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVocabulary {
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub version: u32,
    #[serde(default, rename = "company")]
    pub companies: Vec<CompanyRecord>,
    #[serde(default)]
    pub payment_vocabulary: PaymentVocabulary,
    #[serde(default, rename = "special_case")]
    pub special_cases: Vec<SpecialCase>,
}

impl ReferenceData {
    /// The reference document compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED).context("parse embedded reference data")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parse {}", path.display()))
    }

    pub fn find_ticker(&self, ticker: &str) -> Option<&CompanyRecord> {
        self.companies
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker))
    }

    /// Append companies whose ticker is not known yet. Returns how many were added.
    pub fn add_companies(&mut self, companies: Vec<CompanyRecord>) -> usize {
        let mut added = 0;
        for company in companies {
            if self.find_ticker(&company.ticker).is_none() {
                self.companies.push(company);
                added += 1;
            }
        }
        added
    }

    /// Merge another document: known tickers gain the new aliases, unknown ones are appended.
    pub fn merge(&mut self, other: ReferenceData) {
        for company in other.companies {
            match self
                .companies
                .iter_mut()
                .find(|c| c.ticker.eq_ignore_ascii_case(&company.ticker))
            {
                Some(existing) => {
                    for alias in company.aliases {
                        if !existing.aliases.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
                            existing.aliases.push(alias);
                        }
                    }
                }
                None => self.companies.push(company),
            }
        }
        self.payment_vocabulary.terms.extend(other.payment_vocabulary.terms);
        self.special_cases.extend(other.special_cases);
        self.version = self.version.max(other.version);
    }

    /// Special cases whose ticker is not a known company are reported and dropped.
    pub fn validate(&mut self) {
        let known: Vec<String> = self.companies.iter().map(|c| c.ticker.to_uppercase()).collect();
        self.special_cases.retain(|sc| {
            let ok = known.contains(&sc.ticker.to_uppercase());
            if !ok {
                warn!(fragment = %sc.fragment, ticker = %sc.ticker, "special case names unknown ticker");
            }
            ok
        });
    }
}

/// Where reference data comes from, beyond the embedded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Extra TOML document in the embedded format.
    pub companies_file: Option<PathBuf>,
    /// Fetch index constituents at start-up. Never blocks extraction.
    pub enrich: bool,
    pub index_sources: Vec<IndexSource>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            companies_file: None,
            enrich: false,
            index_sources: IndexSource::defaults(),
        }
    }
}

/// Embedded data, then the user file, then (best effort) index enrichment.
pub fn load_reference(config: &ReferenceConfig, timeout: Duration) -> Result<ReferenceData> {
    let mut reference = ReferenceData::embedded()?;

    if let Some(path) = &config.companies_file {
        reference.merge(ReferenceData::load_file(path)?);
    }

    if config.enrich {
        let added = enrich_from_indexes(&mut reference, &config.index_sources, timeout);
        info!(added, "index enrichment finished");
    }

    reference.validate();
    info!(
        companies = reference.companies.len(),
        special_cases = reference.special_cases.len(),
        "reference data loaded"
    );
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatif_core::Exchange;

    #[test]
    fn test_embedded_reference_parses() {
        let r = ReferenceData::embedded().unwrap();
        assert_eq!(r.version, 1);
        assert!(r.companies.len() >= 40);
        let nflx = r.find_ticker("NFLX").unwrap();
        assert_eq!(nflx.canonical_name, "Netflix");
        assert_eq!(nflx.exchange, Exchange::Nasdaq);
        assert!(r.payment_vocabulary.terms.iter().any(|t| t == "visa"));
    }

    #[test]
    fn test_embedded_special_cases_all_resolve() {
        let mut r = ReferenceData::embedded().unwrap();
        let before = r.special_cases.len();
        r.validate();
        assert_eq!(r.special_cases.len(), before);
    }

    #[test]
    fn test_merge_extends_aliases_and_appends() {
        let mut r = ReferenceData::embedded().unwrap();
        let extra = ReferenceData::from_toml_str(
            r#"
            version = 2

            [[company]]
            name = "Netflix"
            ticker = "nflx"
            exchange = "nasdaq"
            aliases = ["nflx.com"]

            [[company]]
            name = "Super-Pharm Holdings"
            ticker = "SPRM"
            exchange = "tase"
            aliases = ["סופר פארם"]
            "#,
        )
        .unwrap();
        let count = r.companies.len();
        r.merge(extra);

        assert_eq!(r.version, 2);
        assert_eq!(r.companies.len(), count + 1);
        assert!(r.find_ticker("NFLX").unwrap().aliases.contains(&"nflx.com".to_string()));
        assert_eq!(r.find_ticker("SPRM").unwrap().exchange, Exchange::Tase);
    }

    #[test]
    fn test_validate_drops_unknown_special_case() {
        let mut r = ReferenceData::from_toml_str(
            r#"
            [[company]]
            name = "Netflix"
            ticker = "NFLX"
            exchange = "nasdaq"

            [[special_case]]
            fragment = "xyz"
            ticker = "NOPE"
            "#,
        )
        .unwrap();
        r.validate();
        assert!(r.special_cases.is_empty());
    }

    #[test]
    fn test_add_companies_skips_known_tickers() {
        let mut r = ReferenceData::embedded().unwrap();
        let count = r.companies.len();
        let added = r.add_companies(vec![
            CompanyRecord::new("Netflix Inc.", "NFLX", Exchange::Nasdaq, &[]),
            CompanyRecord::new("Costco Wholesale", "COST", Exchange::Nasdaq, &[]),
        ]);
        assert_eq!(added, 1);
        assert_eq!(r.companies.len(), count + 1);
    }

    #[test]
    fn test_index_sources_ship_disabled() {
        let config = ReferenceConfig::default();
        assert!(!config.enrich);
        assert_eq!(config.index_sources.len(), 5);

        let config: ReferenceConfig = toml::from_str(
            r#"
            enrich = true

            [[index_sources]]
            name = "DAX"
            url = "https://en.wikipedia.org/wiki/DAX"
            format = "html-table"
            symbol_column = "Ticker"
            name_column = "Company"
            exchange = "xetra"
            "#,
        )
        .unwrap();
        assert!(config.enrich);
        assert_eq!(config.index_sources.len(), 1);
        assert_eq!(config.index_sources[0].format, crate::enrich::IndexFormat::HtmlTable);
    }
}
