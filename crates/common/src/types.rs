use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Suffix the market data provider expects on NSE symbols.
pub const EXCHANGE_SUFFIX: &str = ".NS";

/// Sector classification is not implemented; every match carries this label.
pub const SECTOR_UNKNOWN: &str = "unknown";

/// Lifecycle tag stamped on every history row at insertion.
pub const STATUS_NEW: &str = "new";

/// Strip the exchange suffix from a provider symbol (`"TCS.NS"` -> `"TCS"`).
pub fn strip_exchange_suffix(symbol: &str) -> &str {
    symbol.strip_suffix(EXCHANGE_SUFFIX).unwrap_or(symbol)
}

/// One trading day of OHLCV data for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Daily bars for one symbol, oldest first, capped at the trailing
/// [`PriceSeries::MAX_BARS`] trading days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Roughly one calendar year of trading days.
    pub const MAX_BARS: usize = 252;

    /// Build a series, sorting by date and keeping only the trailing window.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        if bars.len() > Self::MAX_BARS {
            bars.drain(..bars.len() - Self::MAX_BARS);
        }
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// The two fixed rule sets a scan can run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT")]
pub enum ScanStrategy {
    /// Breakout: stacked uptrend with a volume surge.
    Golden,
    /// Value: price near its yearly low or its long-term trend line.
    Bottom,
}

impl ScanStrategy {
    pub const ALL: [ScanStrategy; 2] = [ScanStrategy::Golden, ScanStrategy::Bottom];

    /// Label written to the `strategy` column of the history table.
    pub fn label(&self) -> &'static str {
        match self {
            ScanStrategy::Golden => "Golden",
            ScanStrategy::Bottom => "Bottom",
        }
    }

    /// Fixed score label attached to every match of this strategy.
    pub fn score_label(&self) -> &'static str {
        match self {
            ScanStrategy::Golden => "9/10",
            ScanStrategy::Bottom => "8/10",
        }
    }
}

impl std::fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ScanStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "golden" | "breakout" => Ok(ScanStrategy::Golden),
            "bottom" | "bottom_fish" | "bottomfish" => Ok(ScanStrategy::Bottom),
            other => Err(crate::Error::Other(format!(
                "unknown strategy '{other}', expected 'golden' or 'bottom'"
            ))),
        }
    }
}

/// The strategy-specific figure reported alongside a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    /// Latest volume over its 20-day average, one decimal.
    #[serde(rename = "Rel_Vol")]
    RelVolume(f64),
    /// Percent above the one-year closing low, one decimal.
    #[serde(rename = "Dist_Low")]
    DistFromLow(f64),
}

impl Metric {
    pub fn value(&self) -> f64 {
        match self {
            Metric::RelVolume(v) | Metric::DistFromLow(v) => *v,
        }
    }
}

/// One symbol that passed every gate of a strategy. Field names serialize
/// to the dashboard's table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "Stock")]
    pub symbol: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Score")]
    pub score: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(flatten)]
    pub metric: Metric,
}

/// Why a symbol did not produce a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    InsufficientHistory { bars: usize },
    BelowPriceFloor,
    Illiquid,
    TrendNotStacked,
    NoVolumeSurge,
    RsiOutOfBand,
    WeakTrend,
    FarFromSupport,
    Overbought,
    IndicatorUndefined,
    /// The market data provider failed for this symbol.
    DataUnavailable(String),
    /// Scoring the fetched history did not complete.
    ScoringFailed(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::InsufficientHistory { bars } => write!(f, "only {bars} bars of history"),
            Rejection::BelowPriceFloor => write!(f, "price below floor"),
            Rejection::Illiquid => write!(f, "average volume below minimum"),
            Rejection::TrendNotStacked => write!(f, "close/SMA50/SMA200 not stacked"),
            Rejection::NoVolumeSurge => write!(f, "no relative volume surge"),
            Rejection::RsiOutOfBand => write!(f, "RSI outside band"),
            Rejection::WeakTrend => write!(f, "ADX below minimum"),
            Rejection::FarFromSupport => write!(f, "not near yearly low or EMA200"),
            Rejection::Overbought => write!(f, "RSI overbought"),
            Rejection::IndicatorUndefined => write!(f, "indicator undefined"),
            Rejection::DataUnavailable(e) => write!(f, "data unavailable: {e}"),
            Rejection::ScoringFailed(e) => write!(f, "scoring failed: {e}"),
        }
    }
}

/// Outcome of scoring one symbol. Provider and computation failures are
/// folded into [`Evaluation::NoMatch`]; nothing escapes as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Match(MatchRecord),
    NoMatch(Rejection),
}

impl Evaluation {
    pub fn into_match(self) -> Option<MatchRecord> {
        match self {
            Evaluation::Match(record) => Some(record),
            Evaluation::NoMatch(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Evaluation::Match(_))
    }
}

/// Matches from one scan of one strategy, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub strategy: ScanStrategy,
    pub rows: Vec<MatchRecord>,
    /// Number of symbols dispatched to the worker pool.
    pub symbols_scanned: usize,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn empty(strategy: ScanStrategy) -> Self {
        Self {
            strategy,
            rows: Vec::new(),
            symbols_scanned: 0,
            scanned_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row as displayed; used for the notification summary.
    pub fn top(&self) -> Option<&MatchRecord> {
        self.rows.first()
    }
}

/// A persisted match, as read back from the history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    /// ISO date (`YYYY-MM-DD`) of the scan that produced the row.
    pub date: String,
    pub stock: String,
    pub strategy: String,
    pub price: f64,
    pub score: String,
    pub sector: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day as u64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn series_keeps_trailing_window_in_date_order() {
        let bars: Vec<PriceBar> = (0..300).rev().map(|d| bar(d, d as f64)).collect();
        let series = PriceSeries::new("TCS.NS", bars);
        assert_eq!(series.len(), PriceSeries::MAX_BARS);
        assert_eq!(series.bars()[0].close, 48.0);
        assert_eq!(series.last().unwrap().close, 299.0);
    }

    #[test]
    fn suffix_is_stripped_only_at_end() {
        assert_eq!(strip_exchange_suffix("INFY.NS"), "INFY");
        assert_eq!(strip_exchange_suffix("INFY"), "INFY");
        assert_eq!(strip_exchange_suffix("NS.NSE"), "NS.NSE");
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("GOLDEN".parse::<ScanStrategy>().unwrap(), ScanStrategy::Golden);
        assert_eq!("Bottom".parse::<ScanStrategy>().unwrap(), ScanStrategy::Bottom);
        assert!("momentum".parse::<ScanStrategy>().is_err());
    }

    #[test]
    fn match_record_serializes_to_table_columns() {
        let record = MatchRecord {
            symbol: "TCS".into(),
            price: 100.0,
            score: "9/10".into(),
            sector: SECTOR_UNKNOWN.into(),
            metric: Metric::RelVolume(2.0),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Stock"], "TCS");
        assert_eq!(json["Rel_Vol"], 2.0);
        assert!(json.get("Dist_Low").is_none());
    }
}
