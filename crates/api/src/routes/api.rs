use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use common::{Config, ScanResult, ScanStrategy};
use telegram_notify::report_message;

use crate::AppState;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/scan/:strategy", get(get_scan).post(run_scan))
        .route("/api/scan/:strategy/save", post(save_scan))
        .route("/api/scan/:strategy/notify", post(notify_scan))
        .route("/api/history", get(get_history))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

fn parse_strategy(raw: &str) -> Result<ScanStrategy, (StatusCode, Json<Value>)> {
    raw.parse()
        .map_err(|e: common::Error| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

fn scan_json(result: &ScanResult) -> Value {
    let mut body = json!({
        "strategy": result.strategy,
        "count": result.len(),
        "symbols_scanned": result.symbols_scanned,
        "scanned_at": result.scanned_at,
        "rows": result.rows,
    });
    if result.is_empty() {
        body["notice"] = json!("No stocks found matching criteria.");
    }
    body
}

async fn current_scan(
    state: &AppState,
    strategy: ScanStrategy,
) -> Result<ScanResult, (StatusCode, Json<Value>)> {
    state
        .current
        .read()
        .await
        .get(&strategy)
        .cloned()
        .ok_or_else(|| {
            error_response(
                StatusCode::NOT_FOUND,
                format!("no {strategy} scan has been run yet"),
            )
        })
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ScanQuery {
    limit: Option<usize>,
}

/// Run a scan synchronously and make it the current result for its strategy.
async fn run_scan(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
    Query(q): Query<ScanQuery>,
) -> ApiResult {
    let strategy = parse_strategy(&strategy)?;
    let limit = q.limit.unwrap_or(state.default_limit);
    if !(Config::MIN_SCAN_LIMIT..=Config::MAX_SCAN_LIMIT).contains(&limit) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "limit must be between {} and {}",
                Config::MIN_SCAN_LIMIT,
                Config::MAX_SCAN_LIMIT
            ),
        ));
    }

    info!(%strategy, limit, "Scan requested from dashboard");
    let result = state.scanner.run_scan(strategy, limit).await;
    let body = scan_json(&result);
    state.current.write().await.insert(strategy, result);
    Ok(Json(body))
}

async fn get_scan(State(state): State<AppState>, Path(strategy): Path<String>) -> ApiResult {
    let strategy = parse_strategy(&strategy)?;
    let result = current_scan(&state, strategy).await?;
    Ok(Json(scan_json(&result)))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

async fn save_scan(State(state): State<AppState>, Path(strategy): Path<String>) -> ApiResult {
    let strategy = parse_strategy(&strategy)?;
    let result = current_scan(&state, strategy).await?;

    match state.history.save(&result).await {
        Ok(rows) => Ok(Json(json!({ "status": "saved", "rows": rows }))),
        Err(e) => {
            error!(%strategy, error = %e, "Failed to save scan to history");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("save failed: {e}"),
            ))
        }
    }
}

// ─── Notify ───────────────────────────────────────────────────────────────────

/// Forward the current result's summary. Delivery failures are logged only.
async fn notify_scan(State(state): State<AppState>, Path(strategy): Path<String>) -> ApiResult {
    let strategy = parse_strategy(&strategy)?;
    let result = current_scan(&state, strategy).await?;

    let Some(message) = report_message(&result) else {
        return Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "no matches to send",
        ));
    };

    if let Err(e) = state.notifier.notify(&message).await {
        warn!(%strategy, error = %e, "Report not delivered");
    }
    Ok(Json(json!({ "status": "sent", "message": message })))
}

// ─── History ──────────────────────────────────────────────────────────────────

async fn get_history(State(state): State<AppState>) -> Json<Value> {
    let rows = state.history.history().await;
    let empty = rows.is_empty();
    let mut body = json!({ "count": rows.len(), "rows": rows });
    if empty {
        body["notice"] = json!("Database is empty. Run a scan and save results!");
    }
    Json(body)
}
