//! Historical and current share prices.
//!
//! `YahooPriceService` reads the public chart endpoint with one blocking request
//! per lookup, a per-request timeout and no retries. `CachedPriceService` wraps
//! any service so a symbol is fetched at most once per run.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::rates::FixedRates;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

pub trait PriceService {
    /// Daily closes from `start` (inclusive) to now, oldest first.
    fn price_series(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>>;

    /// Latest traded price, `None` when the venue reports none.
    fn current_price(&self, symbol: &str) -> Result<Option<Decimal>>;
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("HTTP {status} for {symbol}")]
    Http { symbol: String, status: u16 },
    #[error("chart API error for {symbol}: {code} - {description}")]
    Api {
        symbol: String,
        code: String,
        description: String,
    },
    #[error("malformed chart response: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub rates: FixedRates,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            rates: FixedRates::default(),
        }
    }
}

impl PriceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub struct YahooPriceService {
    client: Client,
    base_url: String,
}

impl YahooPriceService {
    pub fn new(config: &PriceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64) whatif/0.1"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn symbol_url(&self, symbol: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(symbol))
    }

    fn fetch_chart(&self, symbol: &str, url: &str) -> Result<Value> {
        debug!(symbol, url, "fetching chart");
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request chart for {symbol}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::Http {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let data: Value = resp
            .json()
            .with_context(|| format!("decode chart JSON for {symbol}"))?;
        check_api_error(symbol, &data)?;
        Ok(data)
    }
}

impl PriceService for YahooPriceService {
    fn price_series(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>> {
        let from_ts = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let to_ts = Utc::now().timestamp();
        let url = format!(
            "{}?period1={from_ts}&period2={to_ts}&interval=1d",
            self.symbol_url(symbol)
        );
        let data = self.fetch_chart(symbol, &url)?;
        let mut series = parse_chart_series(&data)?;
        series.retain(|p| p.date >= start);
        Ok(series)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        let url = format!("{}?interval=1d&range=1d", self.symbol_url(symbol));
        let data = self.fetch_chart(symbol, &url)?;
        parse_current_price(&data)
    }
}

fn check_api_error(symbol: &str, data: &Value) -> Result<(), QuoteError> {
    if let Some(error) = data
        .get("chart")
        .and_then(|c| c.get("error"))
        .and_then(|e| e.as_object())
    {
        let field = |k: &str| {
            error
                .get(k)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };
        return Err(QuoteError::Api {
            symbol: symbol.to_string(),
            code: field("code"),
            description: field("description"),
        });
    }
    Ok(())
}

fn chart_result(data: &Value) -> Result<&Value, QuoteError> {
    data.get("chart")
        .and_then(|c| c.get("result"))
        .and_then(|r| r.get(0))
        .ok_or(QuoteError::Malformed("missing chart.result"))
}

fn to_price(v: &Value) -> Option<Decimal> {
    v.as_f64()
        .and_then(Decimal::from_f64)
        .map(|d| d.round_dp(4))
        .filter(|d| d.is_sign_positive() && !d.is_zero())
}

/// Daily closes from a chart response. Null closes (halted days) are skipped;
/// timestamps are shifted by the venue's UTC offset before taking the date.
pub fn parse_chart_series(data: &Value) -> Result<Vec<PricePoint>> {
    let chart = chart_result(data)?;
    let Some(timestamps) = chart.get("timestamp").and_then(|t| t.as_array()) else {
        return Ok(Vec::new());
    };
    let closes = chart
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.get(0))
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .ok_or(QuoteError::Malformed("missing indicators.quote[0].close"))?;
    let offset = chart
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|o| o.as_i64())
        .unwrap_or(0);

    let mut series: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.as_i64()? + offset, 0)?.date_naive();
            Some(PricePoint {
                date,
                close: to_price(close)?,
            })
        })
        .collect();
    series.sort_by_key(|p| p.date);
    series.dedup_by_key(|p| p.date);
    Ok(series)
}

/// `meta.regularMarketPrice`, falling back to the last non-null close.
pub fn parse_current_price(data: &Value) -> Result<Option<Decimal>> {
    let chart = chart_result(data)?;
    let from_meta = chart
        .get("meta")
        .and_then(|m| m.get("regularMarketPrice"))
        .and_then(to_price);
    if from_meta.is_some() {
        return Ok(from_meta);
    }
    Ok(chart
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.get(0))
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.iter().rev().find_map(to_price)))
}

struct CachedSeries {
    start: NaiveDate,
    result: Result<Vec<PricePoint>, String>,
}

/// Per-run memo over another service. Failures are cached too: a symbol that
/// failed once stays unavailable for the rest of the run.
pub struct CachedPriceService<S> {
    inner: S,
    series: RefCell<HashMap<String, CachedSeries>>,
    current: RefCell<HashMap<String, Result<Option<Decimal>, String>>>,
}

impl<S: PriceService> CachedPriceService<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            series: RefCell::new(HashMap::new()),
            current: RefCell::new(HashMap::new()),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PriceService> PriceService for CachedPriceService<S> {
    fn price_series(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>> {
        if let Some(cached) = self.series.borrow().get(symbol) {
            match &cached.result {
                Err(e) => return Err(anyhow::anyhow!("{e}")),
                Ok(points) if start >= cached.start => {
                    return Ok(points.iter().filter(|p| p.date >= start).copied().collect());
                }
                Ok(_) => {}
            }
        }

        let result = self.inner.price_series(symbol, start);
        if let Err(e) = &result {
            warn!(symbol, "price history lookup failed: {e:#}");
        }
        let stored = match &result {
            Ok(points) => Ok(points.clone()),
            Err(e) => Err(format!("{e:#}")),
        };
        self.series.borrow_mut().insert(
            symbol.to_string(),
            CachedSeries {
                start,
                result: stored,
            },
        );
        result
    }

    fn current_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        if let Some(cached) = self.current.borrow().get(symbol) {
            return cached.clone().map_err(|e| anyhow::anyhow!("{e}"));
        }
        let result = self.inner.current_price(symbol);
        if let Err(e) = &result {
            warn!(symbol, "current price lookup failed: {e:#}");
        }
        let stored = match &result {
            Ok(p) => Ok(*p),
            Err(e) => Err(format!("{e:#}")),
        };
        self.current.borrow_mut().insert(symbol.to_string(), stored);
        result
    }
}
