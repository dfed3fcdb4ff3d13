//! Statement-level pipeline: resolve every transaction, evaluate every match.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use whatif_core::{MatchResult, PerformanceRecord, Transaction, Unavailable};
use whatif_ingest::{ExtractionReport, ExtractionStats};

use crate::performance::PerformanceCalculator;
use crate::resolver::MerchantResolver;

#[derive(Debug, Clone, Serialize)]
pub struct UnavailableMatch {
    #[serde(rename = "match")]
    pub matched: MatchResult,
    pub reason: Unavailable,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub stats: ExtractionStats,
    pub transactions: Vec<Transaction>,
    pub matches: Vec<MatchResult>,
    /// Transactions with no candidate company.
    pub unmatched: Vec<Transaction>,
    pub performance: Vec<PerformanceRecord>,
    pub unavailable: Vec<UnavailableMatch>,
}

/// Without a calculator (offline runs) matches are reported with no performance.
pub fn analyze(
    report: &ExtractionReport,
    resolver: &MerchantResolver,
    calculator: Option<&PerformanceCalculator<'_>>,
    today: NaiveDate,
) -> Analysis {
    let mut analysis = Analysis {
        stats: report.stats.clone(),
        transactions: report.transactions.clone(),
        ..Analysis::default()
    };

    for txn in &report.transactions {
        let matches = resolver.resolve_transaction(txn);
        if matches.is_empty() {
            analysis.unmatched.push(txn.clone());
            continue;
        }
        for m in matches {
            if let Some(calc) = calculator {
                match calc.evaluate(&m, today) {
                    Ok(rec) => analysis.performance.push(rec),
                    Err(reason) => analysis.unavailable.push(UnavailableMatch {
                        matched: m.clone(),
                        reason,
                    }),
                }
            }
            analysis.matches.push(m);
        }
    }

    info!(
        transactions = analysis.transactions.len(),
        matches = analysis.matches.len(),
        unmatched = analysis.unmatched.len(),
        evaluated = analysis.performance.len(),
        unavailable = analysis.unavailable.len(),
        "analysis complete"
    );
    analysis
}
