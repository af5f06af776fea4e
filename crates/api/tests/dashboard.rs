use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Days, NaiveDate};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use api::{app, AppState};
use common::{
    Error, MarketDataProvider, Notifier, PriceBar, PriceSeries, Result, SymbolUniverse,
};
use engine::Scanner;
use history::HistoryStore;
use strategy::ScreenerRegistry;

// ─── Fakes ────────────────────────────────────────────────────────────────────

struct FixedUniverse(Vec<String>);

#[async_trait]
impl SymbolUniverse for FixedUniverse {
    async fn symbols(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Breakout-shaped history for `HOT*`, provider failure for everything else.
struct FakeMarket;

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries> {
        if !symbol.starts_with("HOT") {
            return Err(Error::MarketData(format!("{symbol}: no data")));
        }
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut close = 100.0;
        let bars = (0..252)
            .map(|i| {
                if i > 0 {
                    close += if (i - 1) % 2 == 0 { 2.0 } else { -1.0 };
                }
                PriceBar {
                    date: start + Days::new(i as u64),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: if i == 251 { 300_000.0 } else { 100_000.0 },
                }
            })
            .collect();
        Ok(PriceSeries::new(symbol, bars))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Notify("bot blocked".into()));
        }
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    app: Router,
    notifier: Arc<RecordingNotifier>,
}

async fn harness_with(universe: &[&str], notifier: RecordingNotifier) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("dash.db").display());
    let history = HistoryStore::new(&url).unwrap();
    history.init().await.unwrap();

    let symbols = universe.iter().map(|s| format!("{s}.NS")).collect();
    let scanner = Scanner::new(
        Arc::new(FixedUniverse(symbols)),
        Arc::new(FakeMarket),
        ScreenerRegistry::default(),
        4,
    );
    let notifier = Arc::new(notifier);
    let state = AppState::new(scanner, history, notifier.clone(), 200);
    Harness {
        _dir: dir,
        app: app(state),
        notifier,
    }
}

async fn harness(universe: &[&str]) -> Harness {
    harness_with(universe, RecordingNotifier::default()).await
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_returns_table_rows() {
    let h = harness(&["HOT1", "COLD1", "HOT2"]).await;
    let (status, body) = send(&h.app, "POST", "/api/scan/golden?limit=50").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "Golden");
    assert_eq!(body["count"], 2);
    assert_eq!(body["symbols_scanned"], 3);
    let row = &body["rows"][0];
    assert_eq!(row["Price"], 227.0);
    assert_eq!(row["Score"], "9/10");
    assert_eq!(row["Sector"], "unknown");
    assert_eq!(row["Rel_Vol"], 2.7);
    assert!(body.get("notice").is_none());
}

#[tokio::test]
async fn empty_scan_carries_notice() {
    let h = harness(&["COLD1"]).await;
    let (status, body) = send(&h.app, "POST", "/api/scan/bottom").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["notice"], "No stocks found matching criteria.");
}

#[tokio::test]
async fn out_of_range_limit_is_rejected() {
    let h = harness(&["HOT1"]).await;
    for uri in ["/api/scan/golden?limit=49", "/api/scan/golden?limit=3001"] {
        let (status, _) = send(&h.app, "POST", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn unknown_strategy_is_rejected() {
    let h = harness(&["HOT1"]).await;
    let (status, body) = send(&h.app, "POST", "/api/scan/momentum").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("momentum"));
}

#[tokio::test]
async fn save_before_scan_is_not_found() {
    let h = harness(&["HOT1"]).await;
    let (status, _) = send(&h.app, "POST", "/api/scan/golden/save").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn saved_scan_appears_in_history() {
    let h = harness(&["HOT1", "HOT2"]).await;
    send(&h.app, "POST", "/api/scan/golden").await;

    let (status, body) = send(&h.app, "POST", "/api/scan/golden/save").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 2);

    let (_, history) = send(&h.app, "GET", "/api/history").await;
    assert_eq!(history["count"], 2);
    let entry = &history["rows"][0];
    assert_eq!(entry["strategy"], "Golden");
    assert_eq!(entry["status"], "new");
    assert_eq!(entry["score"], "9/10");
}

#[tokio::test]
async fn empty_history_is_not_an_error() {
    let h = harness(&[]).await;
    let (status, body) = send(&h.app, "GET", "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["notice"].is_string());
}

#[tokio::test]
async fn notify_sends_summary_of_current_scan() {
    let h = harness(&["HOT1", "HOT2", "COLD"]).await;
    send(&h.app, "POST", "/api/scan/golden").await;

    let (status, body) = send(&h.app, "POST", "/api/scan/golden/notify").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");

    let sent = h.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Found 2 Stocks."));
}

#[tokio::test]
async fn notify_failure_is_not_surfaced() {
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let h = harness_with(&["HOT1"], notifier).await;
    send(&h.app, "POST", "/api/scan/golden").await;

    let (status, _) = send(&h.app, "POST", "/api/scan/golden/notify").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn notify_with_no_matches_sends_nothing() {
    let h = harness(&["COLD"]).await;
    send(&h.app, "POST", "/api/scan/golden").await;
    let (status, _) = send(&h.app, "POST", "/api/scan/golden/notify").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_current_scans() {
    let h = harness(&["HOT1"]).await;
    send(&h.app, "POST", "/api/scan/golden").await;
    let (status, body) = send(&h.app, "GET", "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scans"]["Golden"], 1);
    assert!(body["scans"]["Bottom"].is_null());
}

#[tokio::test]
async fn root_serves_dashboard_page() {
    let h = harness(&[]).await;
    let resp = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Stock Sniper"));
}
