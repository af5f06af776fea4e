use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Map, Value};

use common::ScanStrategy;

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint. Also reports the size of each strategy's current
/// result (`null` until a scan has run).
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let current = state.current.read().await;
    let scans: Map<String, Value> = ScanStrategy::ALL
        .iter()
        .map(|s| {
            let count = current.get(s).map(|r| json!(r.len())).unwrap_or(Value::Null);
            (s.label().to_string(), count)
        })
        .collect();

    Json(json!({
        "status": "ok",
        "workers": state.scanner.workers(),
        "scans": scans,
    }))
}
