//! Merchant description -> candidate companies.
//!
//! Stages run in order and the first stage with any hit ends resolution:
//! 1) exact: cleaned text equals a cleaned name or alias
//! 2) containment: an alias longer than `min_alias_len` is a substring, or the reverse
//! 3) special cases: reversed / truncated brand fragments
//! 4) fuzzy: partial similarity against Latin-script canonical names
//!
//! Payment vocabulary ("visa", "העברה", "american express") is removed as whole
//! phrases before any stage runs; text made only of such vocabulary resolves to
//! nothing. Several companies may match; all are returned.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, trace};
use whatif_core::{CompanyRecord, Diagnostics, MatchConfidence, MatchResult, Transaction};

use crate::reference::ReferenceData;
use crate::similarity::partial_ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResolveStage {
    Exact,
    Containment,
    SpecialCase,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum partial-similarity score (0-100) for a fuzzy candidate.
    pub fuzzy_threshold: u8,
    /// Aliases must be longer than this to take part in containment matching.
    pub min_alias_len: usize,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 80,
            min_alias_len: 3,
            diagnostics: Diagnostics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub company: CompanyRecord,
    pub confidence: MatchConfidence,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Best first; at most one entry per ticker.
    pub candidates: Vec<Candidate>,
    pub stages_run: Vec<ResolveStage>,
    /// The text was payment-method vocabulary only.
    pub suppressed: bool,
}

struct Entry {
    company: CompanyRecord,
    /// Cleaned canonical name followed by cleaned aliases.
    keys: Vec<String>,
    latin: bool,
}

struct Fragment {
    cleaned: String,
    entry: usize,
}

pub struct MerchantResolver {
    entries: Vec<Entry>,
    fragments: Vec<Fragment>,
    /// Cleaned vocabulary terms as token sequences, longest first.
    vocabulary: Vec<Vec<String>>,
    config: ResolverConfig,
}

/// Lowercase, punctuation to word breaks, collapse whitespace.
/// "NETFLIX.COM" -> "netflix com", "MC DONALD'S" -> "mc donalds".
pub fn clean(s: &str) -> String {
    let kept: String = s
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '`' | '׳' | '״' | '"'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl MerchantResolver {
    pub fn new(reference: &ReferenceData, config: ResolverConfig) -> Self {
        let entries: Vec<Entry> = reference
            .companies
            .iter()
            .map(|company| {
                let mut keys: Vec<String> = Vec::new();
                for name in company.names() {
                    let key = clean(name);
                    if !key.is_empty() && !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                Entry {
                    latin: company.is_latin(),
                    company: company.clone(),
                    keys,
                }
            })
            .collect();

        let fragments = reference
            .special_cases
            .iter()
            .filter_map(|sc| {
                let entry = entries
                    .iter()
                    .position(|e| e.company.ticker.eq_ignore_ascii_case(&sc.ticker))?;
                let cleaned = clean(&sc.fragment);
                (!cleaned.is_empty()).then_some(Fragment { cleaned, entry })
            })
            .collect();

        let mut vocabulary: Vec<Vec<String>> = reference
            .payment_vocabulary
            .terms
            .iter()
            .map(|t| clean(t).split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        vocabulary.sort_by_key(|phrase| std::cmp::Reverse(phrase.len()));
        vocabulary.dedup();

        Self {
            entries,
            fragments,
            vocabulary,
            config,
        }
    }

    pub fn companies(&self) -> impl Iterator<Item = &CompanyRecord> {
        self.entries.iter().map(|e| &e.company)
    }

    pub fn resolve(&self, merchant_text: &str) -> Resolution {
        let text = clean(merchant_text);
        let mut resolution = Resolution::default();

        if text.is_empty() {
            return resolution;
        }
        let (text, removed) = self.strip_payment_terms(&text);
        let nothing_left = text
            .split(' ')
            .all(|token| token.chars().all(|c| c.is_ascii_digit()));
        if removed && nothing_left {
            resolution.suppressed = true;
            self.trace(merchant_text, &resolution);
            return resolution;
        }

        for stage in [
            ResolveStage::Exact,
            ResolveStage::Containment,
            ResolveStage::SpecialCase,
            ResolveStage::Fuzzy,
        ] {
            resolution.stages_run.push(stage);
            let hits = match stage {
                ResolveStage::Exact => self.exact(&text),
                ResolveStage::Containment => self.containment(&text),
                ResolveStage::SpecialCase => self.special_cases(&text),
                ResolveStage::Fuzzy => self.fuzzy(&text),
            };
            if !hits.is_empty() {
                resolution.candidates = self.dedupe(hits);
                break;
            }
        }

        self.trace(merchant_text, &resolution);
        resolution
    }

    pub fn resolve_transaction(&self, transaction: &Transaction) -> Vec<MatchResult> {
        self.resolve(&transaction.merchant_text)
            .candidates
            .into_iter()
            .map(|c| MatchResult {
                transaction: transaction.clone(),
                company: c.company,
                match_confidence: c.confidence,
                match_score: c.score,
            })
            .collect()
    }

    /// Drop payment-vocabulary phrases, matching whole tokens only. Returns the
    /// remaining text and whether anything was dropped.
    fn strip_payment_terms(&self, text: &str) -> (String, bool) {
        let tokens: Vec<&str> = text.split(' ').collect();
        let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut removed = false;
        let mut i = 0;
        while i < tokens.len() {
            let rest = &tokens[i..];
            let phrase = self.vocabulary.iter().find(|phrase| {
                phrase.len() <= rest.len() && phrase.iter().zip(rest).all(|(p, t)| p == t)
            });
            match phrase {
                Some(phrase) => {
                    removed = true;
                    i += phrase.len();
                }
                None => {
                    kept.push(tokens[i]);
                    i += 1;
                }
            }
        }
        (kept.join(" "), removed)
    }

    fn exact(&self, text: &str) -> Vec<(usize, MatchConfidence, Option<u8>)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.keys.iter().any(|k| k == text))
            .map(|(i, _)| (i, MatchConfidence::Exact, None))
            .collect()
    }

    fn containment(&self, text: &str) -> Vec<(usize, MatchConfidence, Option<u8>)> {
        let min = self.config.min_alias_len;
        let text_len = text.chars().count();

        // (entry, longest matching key) so the more specific alias ranks first
        let mut hits: Vec<(usize, usize)> = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            let longest = e
                .keys
                .iter()
                .filter(|k| k.chars().count() > min)
                .filter(|k| text.contains(k.as_str()) || (text_len > min && k.contains(text)))
                .map(|k| k.chars().count())
                .max();
            if let Some(len) = longest {
                hits.push((i, len));
            }
        }
        hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.into_iter()
            .map(|(i, _)| (i, MatchConfidence::Alias, None))
            .collect()
    }

    fn special_cases(&self, text: &str) -> Vec<(usize, MatchConfidence, Option<u8>)> {
        self.fragments
            .iter()
            .filter(|f| text.contains(f.cleaned.as_str()))
            .map(|f| (f.entry, MatchConfidence::Alias, None))
            .collect()
    }

    fn fuzzy(&self, text: &str) -> Vec<(usize, MatchConfidence, Option<u8>)> {
        let min = self.config.min_alias_len;
        let mut hits: Vec<(usize, u8)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.latin)
            .filter_map(|(i, e)| {
                let name = e.keys.first()?;
                if name.chars().count().min(text.chars().count()) <= min {
                    return None;
                }
                let score = partial_ratio(text, name);
                (score >= self.config.fuzzy_threshold).then_some((i, score))
            })
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.into_iter()
            .map(|(i, score)| (i, MatchConfidence::Fuzzy, Some(score)))
            .collect()
    }

    fn dedupe(&self, hits: Vec<(usize, MatchConfidence, Option<u8>)>) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|(i, _, _)| seen.insert(*i))
            .map(|(i, confidence, score)| Candidate {
                company: self.entries[i].company.clone(),
                confidence,
                score,
            })
            .collect()
    }

    fn trace(&self, merchant_text: &str, resolution: &Resolution) {
        let tickers: Vec<&str> = resolution
            .candidates
            .iter()
            .map(|c| c.company.ticker.as_str())
            .collect();
        if self.config.diagnostics.log_resolver_stages {
            info!(
                merchant = merchant_text,
                stages = ?resolution.stages_run,
                suppressed = resolution.suppressed,
                ?tickers,
                "resolved merchant"
            );
        } else {
            trace!(merchant = merchant_text, ?tickers, "resolved merchant");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> MerchantResolver {
        MerchantResolver::new(&ReferenceData::embedded().unwrap(), ResolverConfig::default())
    }

    fn tickers(r: &Resolution) -> Vec<&str> {
        r.candidates.iter().map(|c| c.company.ticker.as_str()).collect()
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("NETFLIX.COM"), "netflix com");
        assert_eq!(clean("  PAYPAL *SPOTIFY  "), "paypal spotify");
        assert_eq!(clean("MASTERCARD*SPOTIFY"), "mastercard spotify");
        assert_eq!(clean("MC DONALD'S"), "mc donalds");
        assert_eq!(clean("צ'ק  פוינט"), "צק פוינט");
    }

    #[test]
    fn test_exact_alias_short_circuits() {
        let r = resolver().resolve("NETFLIX.COM");
        assert_eq!(tickers(&r), vec!["NFLX"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Exact);
        assert_eq!(r.candidates[0].score, None);
        assert_eq!(r.stages_run, vec![ResolveStage::Exact]);
    }

    #[test]
    fn test_exact_hebrew_alias() {
        let r = resolver().resolve("שופרסל דיל");
        assert_eq!(tickers(&r), vec!["SAE"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_containment_match() {
        let r = resolver().resolve("SPOTIFY STOCKHOLM SE");
        assert_eq!(tickers(&r), vec!["SPOT"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Alias);
        assert_eq!(r.stages_run, vec![ResolveStage::Exact, ResolveStage::Containment]);
    }

    #[test]
    fn test_two_aliases_return_both_companies() {
        let r = resolver().resolve("PAYPAL *NETFLIX");
        let t = tickers(&r);
        assert_eq!(t.len(), 2);
        assert!(t.contains(&"PYPL"));
        assert!(t.contains(&"NFLX"));
        // Longer alias ranks first
        assert_eq!(t[0], "NFLX");
    }

    #[test]
    fn test_short_aliases_do_not_contain_match() {
        // "פז" and "fox" are too short for containment
        let r = resolver().resolve("FOXTROT BAKERY");
        assert!(r.candidates.iter().all(|c| c.company.ticker != "FOX"));
    }

    #[test]
    fn test_reversed_hebrew_fragment() {
        let r = resolver().resolve("סקילפטנ תונמ");
        assert_eq!(tickers(&r), vec!["NFLX"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Alias);
        assert_eq!(
            r.stages_run,
            vec![ResolveStage::Exact, ResolveStage::Containment, ResolveStage::SpecialCase]
        );
    }

    #[test]
    fn test_truncated_transliteration() {
        let r = resolver().resolve("ALIEXP*HANGZHOU");
        assert_eq!(tickers(&r), vec!["BABA"]);
    }

    #[test]
    fn test_fuzzy_fallback_records_score() {
        let r = resolver().resolve("NETFLX SUBSCRIPTION");
        assert_eq!(r.stages_run.last(), Some(&ResolveStage::Fuzzy));
        let first = &r.candidates[0];
        assert_eq!(first.company.ticker, "NFLX");
        assert_eq!(first.confidence, MatchConfidence::Fuzzy);
        assert_eq!(first.score, Some(86));
        for w in r.candidates.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn test_fuzzy_skips_hebrew_named_companies() {
        // Close to "rami levy" alias, but the canonical name is Hebrew
        let r = resolver().resolve("RAMY LEVI BRANCH");
        assert!(r.candidates.iter().all(|c| c.company.ticker != "RMLI"));
    }

    #[test]
    fn test_payment_method_is_suppressed() {
        let res = resolver();
        for text in ["VISA", "בנק העברה", "העברה בנקאית", "Payment 1234", "עמלת כרטיס"] {
            let r = res.resolve(text);
            assert!(r.candidates.is_empty(), "{text}");
            assert!(r.suppressed, "{text}");
            assert!(r.stages_run.is_empty(), "{text}");
        }
    }

    #[test]
    fn test_payment_word_inside_merchant_is_removed() {
        let r = resolver().resolve("תשלום NETFLIX.COM");
        assert!(!r.suppressed);
        assert_eq!(tickers(&r), vec!["NFLX"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Exact);
        assert_eq!(r.stages_run, vec![ResolveStage::Exact]);
    }

    #[test]
    fn test_card_network_prefix_is_not_a_candidate() {
        let res = resolver();

        let r = res.resolve("VISA NETFLIX.COM");
        assert_eq!(tickers(&r), vec!["NFLX"]);

        let r = res.resolve("MASTERCARD*SPOTIFY");
        assert_eq!(tickers(&r), vec!["SPOT"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_multi_word_terms_match_as_phrases() {
        let res = resolver();
        assert!(res.resolve("AMERICAN EXPRESS").suppressed);
        assert!(res.resolve("LEUMI CARD 4580").suppressed);
        for text in ["EXPRESS", "AMERICAN", "PAY", "LEUMI"] {
            assert!(!res.resolve(text).suppressed, "{text}");
        }
    }

    #[test]
    fn test_word_of_a_payment_phrase_can_name_a_company() {
        let mut reference = ReferenceData::embedded().unwrap();
        reference.add_companies(vec![CompanyRecord::new(
            "Bank Leumi",
            "LUMI",
            whatif_core::Exchange::Tase,
            &["leumi", "לאומי"],
        )]);
        let res = MerchantResolver::new(&reference, ResolverConfig::default());

        let r = res.resolve("LEUMI");
        assert_eq!(tickers(&r), vec!["LUMI"]);
        assert_eq!(r.candidates[0].confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_unknown_merchant_is_empty() {
        let r = resolver().resolve("RANDOM LOCAL CAFE");
        assert!(r.candidates.is_empty());
        assert!(!r.suppressed);
        assert_eq!(r.stages_run.len(), 4);
    }

    #[test]
    fn test_resolve_transaction_carries_transaction() {
        use chrono::NaiveDate;
        use rust_decimal_macros::dec;
        use whatif_core::{Currency, Dialect};

        let txn = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            merchant_text: "NETFLIX.COM".to_string(),
            amount: dec!(45.90),
            currency: Currency::Ils,
            has_latin_script: true,
            original: None,
            kind: None,
            dialect: Dialect::SingleColumn,
            page: 0,
            date_ambiguous: false,
        };
        let matches = resolver().resolve_transaction(&txn);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].transaction, txn);
        assert_eq!(matches[0].company.canonical_name, "Netflix");
        assert_eq!(matches[0].match_confidence, MatchConfidence::Exact);
    }
}
