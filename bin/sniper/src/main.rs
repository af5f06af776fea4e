use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::AppState;
use common::Config;
use engine::{NseUniverse, Scanner, YahooClient};
use history::HistoryStore;
use strategy::{ScreenConfig, ScreenerRegistry};
use telegram_notify::TelegramNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Startup aborted");
            return Err(e).context(
                "Telegram secrets missing or invalid (TELEGRAM_TOKEN, TELEGRAM_CHAT_ID)",
            );
        }
    };
    let screen_cfg = ScreenConfig::load_or_default(cfg.screen_config_path.as_deref())
        .context("loading screening thresholds")?;
    info!(
        port = cfg.dashboard_port,
        scan_limit = cfg.scan_limit,
        workers = cfg.scan_workers,
        "Stock Sniper starting"
    );

    // ── History store ─────────────────────────────────────────────────────────
    let history = HistoryStore::new(&cfg.database_url).context("opening history store")?;
    history.init().await.context("initialising history table")?;

    // ── Providers ─────────────────────────────────────────────────────────────
    let timeout = Duration::from_secs(cfg.http_timeout_secs);
    let universe = Arc::new(NseUniverse::new(timeout)?);
    let market = Arc::new(YahooClient::new(timeout)?);
    let notifier = Arc::new(TelegramNotifier::new(
        cfg.telegram_token.clone(),
        cfg.telegram_chat_id,
    ));

    // ── Scanner ───────────────────────────────────────────────────────────────
    let scanner = Scanner::new(
        universe,
        market,
        ScreenerRegistry::from_config(&screen_cfg),
        cfg.scan_workers,
    );

    // ── Dashboard ─────────────────────────────────────────────────────────────
    let state = AppState::new(scanner, history, notifier, cfg.scan_limit);
    let port = cfg.dashboard_port;

    tokio::select! {
        served = api::serve(state, port) => {
            served.context("dashboard server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }
    Ok(())
}
