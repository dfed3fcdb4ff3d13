//! Optional enrichment from published index-constituent lists (CSV or HTML tables).
//!
//! Best effort only: every failure is logged and the embedded data stands.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;
use tracing::{info, warn};
use whatif_core::{CompanyRecord, Exchange};

use crate::reference::ReferenceData;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexFormat {
    #[default]
    Csv,
    /// First table on the page whose header row has both columns.
    HtmlTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub format: IndexFormat,
    pub symbol_column: String,
    pub name_column: String,
    /// Venue the listed tickers are priced on.
    pub exchange: Exchange,
}

impl IndexSource {
    pub fn sp500() -> Self {
        Self {
            name: "S&P 500".to_string(),
            url: "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv"
                .to_string(),
            format: IndexFormat::Csv,
            symbol_column: "Symbol".to_string(),
            name_column: "Security".to_string(),
            exchange: Exchange::Nyse,
        }
    }

    fn wikipedia(name: &str, page: &str, symbol: &str, company: &str, exchange: Exchange) -> Self {
        Self {
            name: name.to_string(),
            url: format!("https://en.wikipedia.org/wiki/{page}"),
            format: IndexFormat::HtmlTable,
            symbol_column: symbol.to_string(),
            name_column: company.to_string(),
            exchange,
        }
    }

    pub fn nasdaq100() -> Self {
        Self::wikipedia("NASDAQ-100", "NASDAQ-100", "Ticker", "Company", Exchange::Nasdaq)
    }

    pub fn tase() -> Self {
        Self::wikipedia(
            "Tel Aviv Stock Exchange",
            "List_of_companies_listed_on_the_Tel_Aviv_Stock_Exchange",
            "Symbol",
            "Company",
            Exchange::Tase,
        )
    }

    pub fn ftse100() -> Self {
        Self::wikipedia("FTSE 100", "FTSE_100_Index", "Ticker", "Company", Exchange::Lse)
    }

    pub fn dax() -> Self {
        Self::wikipedia("DAX", "DAX", "Ticker", "Company", Exchange::Xetra)
    }

    /// Every list shipped in the default config.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::sp500(),
            Self::nasdaq100(),
            Self::tase(),
            Self::ftse100(),
            Self::dax(),
        ]
    }
}

/// Fetch every source and add unknown tickers. Returns the number of companies added.
pub fn enrich_from_indexes(
    reference: &mut ReferenceData,
    sources: &[IndexSource],
    timeout: Duration,
) -> usize {
    let client = match Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => {
            warn!("index enrichment disabled: {e}");
            return 0;
        }
    };

    let mut added = 0;
    for source in sources {
        match fetch_constituents(&client, source) {
            Ok(companies) => {
                let n = reference.add_companies(companies);
                info!(source = %source.name, added = n, "merged index constituents");
                added += n;
            }
            Err(e) => warn!(source = %source.name, "could not load index constituents: {e:#}"),
        }
    }
    added
}

pub fn fetch_constituents(client: &Client, source: &IndexSource) -> Result<Vec<CompanyRecord>> {
    let resp = client
        .get(&source.url)
        .send()
        .with_context(|| format!("GET {}", source.url))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("HTTP {status} from {}", source.url);
    }
    let body = resp.text().context("read constituents body")?;
    match source.format {
        IndexFormat::Csv => parse_constituents(body.as_bytes(), source),
        IndexFormat::HtmlTable => parse_html_constituents(&body, source),
    }
}

pub fn parse_constituents<R: Read>(reader: R, source: &IndexSource) -> Result<Vec<CompanyRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position = |column: &str| {
        headers
            .iter()
            .position(|h| header_matches(h, column))
            .with_context(|| format!("column {column:?} not found in {}", source.name))
    };
    let symbol_idx = position(&source.symbol_column)?;
    let name_idx = position(&source.name_column)?;

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let symbol = record.get(symbol_idx).unwrap_or("");
        let name = record.get(name_idx).unwrap_or("");
        out.extend(constituent(symbol, name, source));
    }

    Ok(out)
}

/// Rows of the first `<table>` whose header row names both columns.
pub fn parse_html_constituents(html: &str, source: &IndexSource) -> Result<Vec<CompanyRecord>> {
    let table_sel = Selector::parse("table").map_err(|e| anyhow!("table selector: {e:?}"))?;
    let row_sel = Selector::parse("tr").map_err(|e| anyhow!("tr selector: {e:?}"))?;
    let doc = Html::parse_document(html);

    for table in doc.select(&table_sel) {
        let mut rows = table.select(&row_sel).map(row_cells);
        let Some(headers) = rows.next() else {
            continue;
        };
        let position = |column: &str| headers.iter().position(|h| header_matches(h, column));
        let (Some(symbol_idx), Some(name_idx)) =
            (position(&source.symbol_column), position(&source.name_column))
        else {
            continue;
        };

        let mut out = Vec::new();
        for cells in rows {
            let symbol = cells.get(symbol_idx).map(String::as_str).unwrap_or("");
            let name = cells.get(name_idx).map(String::as_str).unwrap_or("");
            out.extend(constituent(symbol, name, source));
        }
        return Ok(out);
    }

    bail!(
        "no table with columns {:?} and {:?} in {}",
        source.symbol_column,
        source.name_column,
        source.name
    )
}

fn row_cells(tr: ElementRef<'_>) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| {
            let text = cell.text().collect::<Vec<_>>().join(" ");
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .collect()
}

/// Case-insensitive, ignoring footnote markers such as "Ticker[4]".
fn header_matches(header: &str, column: &str) -> bool {
    let header = header.split('[').next().unwrap_or(header).trim();
    header.eq_ignore_ascii_case(column.trim())
}

fn constituent(symbol: &str, name: &str, source: &IndexSource) -> Option<CompanyRecord> {
    let symbol = symbol.trim();
    let name = name.trim();
    if symbol.is_empty() || name.is_empty() {
        return None;
    }
    // Lists sometimes print the venue suffix ("ADS.DE"); quote symbols add it back.
    let suffix = source.exchange.quote_suffix();
    let symbol = if suffix.is_empty() {
        symbol
    } else {
        symbol.strip_suffix(suffix).unwrap_or(symbol)
    };

    let short = strip_corporate_suffix(name);
    let aliases: Vec<&str> = if short != name { vec![short] } else { Vec::new() };
    Some(CompanyRecord::new(name, symbol, source.exchange, &aliases))
}

/// "Apple Inc." -> "Apple", "Costco Wholesale Corp" -> "Costco Wholesale".
fn strip_corporate_suffix(name: &str) -> &str {
    const SUFFIXES: [&str; 11] = [
        " inc.", " inc", " corp.", " corp", " corporation", " co.", " company", " ltd.", " ltd",
        " plc", " llc",
    ];
    let trimmed = name.trim_end_matches([',', ' ']);
    let lower = trimmed.to_lowercase();
    for suffix in SUFFIXES {
        if !lower.ends_with(suffix) {
            continue;
        }
        if let Some(head) = trimmed.get(..trimmed.len().saturating_sub(suffix.len())) {
            return head.trim_end_matches([',', ' ']);
        }
    }
    trimmed
}
