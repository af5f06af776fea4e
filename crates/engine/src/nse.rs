use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use common::{Error, Result, SymbolUniverse, EXCHANGE_SUFFIX};

const EQUITY_LIST_URL: &str = "https://archives.nseindia.com/content/equities/EQUITY_L.csv";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-sniper/0.1";

/// NSE equity listing, as published in the exchange's `EQUITY_L.csv`.
pub struct NseUniverse {
    http: Client,
    url: String,
}

impl NseUniverse {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_url(EQUITY_LIST_URL, timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SymbolUniverse for NseUniverse {
    async fn symbols(&self) -> Result<Vec<String>> {
        debug!(url = %self.url, "Fetching NSE equity list");
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Universe(format!("HTTP {status}")));
        }

        let symbols = parse_equity_list(&body)?;
        info!(count = symbols.len(), "NSE universe loaded");
        Ok(symbols)
    }
}

/// Extract the `SYMBOL` column, suffixed for the market data provider,
/// in listing order.
pub fn parse_equity_list(body: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.trim_start_matches('\u{feff}').as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::Universe(format!("unreadable equity list: {e}")))?;
    if headers.is_empty() {
        return Err(Error::Universe("empty equity list".to_string()));
    }
    let column = headers
        .iter()
        .position(|h| h == "SYMBOL")
        .ok_or_else(|| Error::Universe("equity list has no SYMBOL column".to_string()))?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Universe(format!("bad equity list row: {e}")))?;
        match record.get(column) {
            Some(symbol) if !symbol.is_empty() => {
                symbols.push(format!("{symbol}{EXCHANGE_SUFFIX}"))
            }
            _ => {}
        }
    }
    Ok(symbols)
}
