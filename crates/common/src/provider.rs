use async_trait::async_trait;

use crate::{PriceSeries, Result};

/// Source of daily OHLCV history.
///
/// `YahooClient` in `crates/engine` implements this against the public chart
/// API; tests substitute in-memory fakes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to one year of daily bars for `symbol`, oldest first.
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries>;
}

/// Source of the tradable symbol list for the target exchange.
#[async_trait]
pub trait SymbolUniverse: Send + Sync {
    /// All listed symbols, in the provider's listing order.
    async fn symbols(&self) -> Result<Vec<String>>;
}

/// Outbound text channel for scan summaries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}
