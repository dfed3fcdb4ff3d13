//! Page-to-transaction pipeline with per-line failure containment.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use whatif_core::{Currency, Diagnostics, RawPage, Transaction};

use crate::classify::LineClassifier;
use crate::date::{DateNormalizer, DateOrder};
use crate::normalize::TextNormalizer;
use crate::parser::TransactionParser;
use crate::types::{LineError, LineKind};

/// Statement-format configuration. Token lists are data, not logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Section titles, column headers and footer tokens.
    pub boilerplate: Vec<String>,
    /// Type-column tokens of dual-column statements.
    pub transaction_types: Vec<String>,
    /// Currency for amounts printed without a symbol.
    pub default_currency: Currency,
    pub date_order: DateOrder,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            boilerplate: [
                "סה\"כ",
                "סה״כ",
                "פירוט עסקאות",
                "תאריך עסקה",
                "שם בית העסק",
                "סכום חיוב",
                "סכום עסקה",
                "יתרה לתשלום",
                "מועד חיוב",
                "לתשומת לבך",
                "עמוד",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            transaction_types: ["רגילה", "תשלומים", "הוראת קבע", "קרדיט", "דחוי", "זיכוי"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_currency: Currency::Ils,
            date_order: DateOrder::DayFirst,
            diagnostics: Diagnostics::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub pages: usize,
    pub lines: usize,
    pub header_footer: usize,
    pub noise: usize,
    pub candidates: usize,
    pub parsed: usize,
    pub no_shape: usize,
    pub bad_amount: usize,
    pub empty_merchant: usize,
    pub bad_date: usize,
}

impl ExtractionStats {
    fn record_failure(&mut self, err: &LineError) {
        match err {
            LineError::NoShape => self.no_shape += 1,
            LineError::BadAmount(_) => self.bad_amount += 1,
            LineError::EmptyMerchant => self.empty_merchant += 1,
            LineError::BadDate(_) => self.bad_date += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.no_shape + self.bad_amount + self.empty_merchant + self.bad_date
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub transactions: Vec<Transaction>,
    pub stats: ExtractionStats,
}

impl ExtractionReport {
    /// Whole-document outcome the user is told about once.
    pub fn no_transactions_found(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub struct StatementExtractor {
    normalizer: TextNormalizer,
    classifier: LineClassifier,
    parser: TransactionParser,
    diagnostics: Diagnostics,
}

impl StatementExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new(),
            classifier: LineClassifier::new(&config.boilerplate)?,
            parser: TransactionParser::new(
                &config.transaction_types,
                DateNormalizer::new(config.date_order),
                config.default_currency,
            )?,
            diagnostics: config.diagnostics,
        })
    }

    /// Pages in order, lines within a page in order. A bad line never stops the page.
    pub fn extract(&self, pages: &[RawPage]) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        for page in pages {
            report.stats.pages += 1;
            for line in self.normalizer.normalize_page(&page.text) {
                report.stats.lines += 1;
                match self.classifier.classify(&line) {
                    LineKind::HeaderFooter => report.stats.header_footer += 1,
                    LineKind::Noise => report.stats.noise += 1,
                    LineKind::TransactionCandidate => {
                        report.stats.candidates += 1;
                        match self.parser.parse_line(&line, page.index) {
                            Ok(txn) => {
                                report.stats.parsed += 1;
                                report.transactions.push(txn);
                            }
                            Err(err) => {
                                report.stats.record_failure(&err);
                                if self.diagnostics.log_rejected_lines {
                                    warn!(page = page.index, line = %line, "dropped line: {err}");
                                } else {
                                    debug!(page = page.index, "dropped line: {err}");
                                }
                            }
                        }
                    }
                }
            }
        }

        info!(
            pages = report.stats.pages,
            candidates = report.stats.candidates,
            parsed = report.stats.parsed,
            dropped = report.stats.dropped(),
            "extraction finished"
        );
        report
    }
}
