//! Console, CSV and JSON renderings of an analysis.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use whatif_core::{MatchConfidence, MatchResult, PerformanceRecord, Transaction};
use whatif_finance::Analysis;
use whatif_ingest::ExtractionReport;

/// One CSV row per match, with or without performance figures.
#[derive(Debug, Serialize)]
struct Row<'a> {
    date: String,
    merchant: &'a str,
    amount: String,
    currency: &'static str,
    company: &'a str,
    ticker: &'a str,
    confidence: &'static str,
    score: Option<u8>,
    entry_date: Option<String>,
    entry_price: Option<String>,
    current_price: Option<String>,
    invested: Option<String>,
    percent_change: Option<String>,
    value_change: Option<String>,
    status: String,
}

fn confidence_label(c: MatchConfidence) -> &'static str {
    match c {
        MatchConfidence::Exact => "exact",
        MatchConfidence::Alias => "alias",
        MatchConfidence::Fuzzy => "fuzzy",
    }
}

fn row<'a>(m: &'a MatchResult, perf: Option<&PerformanceRecord>, status: String) -> Row<'a> {
    Row {
        date: m.transaction.date.to_string(),
        merchant: &m.transaction.merchant_text,
        amount: m.transaction.amount.to_string(),
        currency: m.transaction.currency.code(),
        company: &m.company.canonical_name,
        ticker: &m.company.ticker,
        confidence: confidence_label(m.match_confidence),
        score: m.match_score,
        entry_date: perf.map(|p| p.entry_date.to_string()),
        entry_price: perf.map(|p| p.entry_price.to_string()),
        current_price: perf.map(|p| p.current_price.to_string()),
        invested: perf.map(|p| p.invested.to_string()),
        percent_change: perf.map(|p| p.percent_change.to_string()),
        value_change: perf.map(|p| p.value_change.to_string()),
        status,
    }
}

fn rows(analysis: &Analysis) -> Vec<Row<'_>> {
    let mut out: Vec<Row<'_>> = analysis
        .performance
        .iter()
        .map(|p| row(&p.matched, Some(p), "ok".to_string()))
        .collect();
    out.extend(
        analysis
            .unavailable
            .iter()
            .map(|u| row(&u.matched, None, format!("unavailable: {}", u.reason))),
    );
    if analysis.performance.is_empty() && analysis.unavailable.is_empty() {
        out.extend(analysis.matches.iter().map(|m| row(m, None, "not evaluated".to_string())));
    }
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

pub fn write_csv<W: Write>(analysis: &Analysis, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in rows(analysis) {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(analysis: &Analysis, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(analysis, file).with_context(|| format!("write {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize JSON")?);
    Ok(())
}

fn print_transaction(t: &Transaction) {
    let flag = if t.date_ambiguous { " (day/month ambiguous)" } else { "" };
    println!("  {} | {} | {}{}", t.date, t.merchant_text, t.charged(), flag);
}

pub fn print_extraction(report: &ExtractionReport) {
    let s = &report.stats;
    println!(
        "Pages: {} | lines: {} | candidates: {} | parsed: {} | dropped: {}\n",
        s.pages,
        s.lines,
        s.candidates,
        s.parsed,
        s.dropped()
    );
    for t in &report.transactions {
        print_transaction(t);
    }
}

pub fn print_analysis(analysis: &Analysis) {
    println!(
        "Transactions: {} | matched: {} | unmatched: {}\n",
        analysis.transactions.len(),
        analysis.matches.len(),
        analysis.unmatched.len()
    );

    if !analysis.performance.is_empty() {
        println!("## If you had bought the shares instead\n");
        for p in &analysis.performance {
            let m = &p.matched;
            println!(
                "- {} {} ({}) on {}: {} -> {:+}% ({:+} {})",
                m.transaction.merchant_text,
                m.company.canonical_name,
                m.company.ticker,
                m.transaction.date,
                p.invested,
                p.percent_change,
                p.value_change,
                p.invested.currency.code()
            );
        }
        println!();
    }

    if !analysis.unavailable.is_empty() {
        println!("## Unavailable\n");
        for u in &analysis.unavailable {
            println!(
                "- {} ({}) on {}: {}",
                u.matched.transaction.merchant_text,
                u.matched.company.ticker,
                u.matched.transaction.date,
                u.reason
            );
        }
        println!();
    }

    if analysis.performance.is_empty() && analysis.unavailable.is_empty() && !analysis.matches.is_empty() {
        println!("## Matches\n");
        for m in &analysis.matches {
            println!(
                "- {} -> {} ({}, {})",
                m.transaction.merchant_text,
                m.company.canonical_name,
                m.company.ticker,
                confidence_label(m.match_confidence)
            );
        }
        println!();
    }

    if !analysis.unmatched.is_empty() {
        println!("## No matching company\n");
        for t in &analysis.unmatched {
            print_transaction(t);
        }
    }
}
