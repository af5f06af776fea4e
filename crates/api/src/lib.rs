pub mod routes;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{Notifier, Result, ScanResult, ScanStrategy};
use engine::Scanner;
use history::HistoryStore;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub scanner: Scanner,
    pub history: HistoryStore,
    pub notifier: Arc<dyn Notifier>,
    /// Latest result per strategy; the target of save and notify actions.
    pub current: Arc<RwLock<HashMap<ScanStrategy, ScanResult>>>,
    /// Scan size used when a request does not name one.
    pub default_limit: usize,
}

impl AppState {
    pub fn new(
        scanner: Scanner,
        history: HistoryStore,
        notifier: Arc<dyn Notifier>,
        default_limit: usize,
    ) -> Self {
        Self {
            scanner,
            history,
            notifier,
            current: Arc::new(RwLock::new(HashMap::new())),
            default_limit,
        }
    }
}

/// The full dashboard router: API, health check and embedded page.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router())
        .merge(routes::health_router())
        .merge(routes::static_router())
        .with_state(state)
        .layer(cors)
}

/// Bind and run the dashboard server until the process exits.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Dashboard listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
