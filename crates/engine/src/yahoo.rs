use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, MarketDataProvider, PriceBar, PriceSeries, Result};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-sniper/0.1";

/// Daily OHLCV history from the Yahoo Finance chart API.
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries> {
        let url = format!(
            "{}/v8/finance/chart/{symbol}?range=1y&interval=1d&includePrePost=false",
            self.base_url
        );
        debug!(symbol, "Fetching daily history");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::MarketData(format!("{symbol}: HTTP {status}")));
        }
        parse_chart(symbol, &body)
    }
}

/// Decode a chart API response body into a series. Bars with any missing
/// OHLCV field (halts, partial sessions) are skipped.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries> {
    let resp: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = resp.chart.error {
        return Err(Error::MarketData(format!(
            "{symbol}: {} ({})",
            err.description, err.code
        )));
    }
    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::MarketData(format!("{symbol}: empty chart result")))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| Error::MarketData(format!("{symbol}: no quote block")))?;

    let offset = FixedOffset::east_opt(result.meta.gmtoffset.unwrap_or(0))
        .ok_or_else(|| Error::MarketData(format!("{symbol}: bad gmtoffset")))?;

    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(PriceBar {
                date: exchange_date(ts, &offset)?,
                open: value_at(&quote.open, i)?,
                high: value_at(&quote.high, i)?,
                low: value_at(&quote.low, i)?,
                close: value_at(&quote.close, i)?,
                volume: value_at(&quote.volume, i)?,
            })
        })
        .collect();

    Ok(PriceSeries::new(symbol, bars))
}

fn exchange_date(ts: i64, offset: &FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(offset).date_naive())
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i32>,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
