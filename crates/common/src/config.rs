use crate::{Error, Result};

/// All configuration loaded from environment variables at startup.
/// Missing required variables are reported as [`Error::Config`]; the binary
/// treats that as fatal before serving anything.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: i64,

    // Dashboard
    pub dashboard_port: u16,

    // Scanning
    pub scan_limit: usize,
    pub scan_workers: usize,
    pub http_timeout_secs: u64,

    // Database
    pub database_url: String,

    // Optional screening thresholds file (TOML)
    pub screen_config_path: Option<String>,
}

impl Config {
    pub const MIN_SCAN_LIMIT: usize = 50;
    pub const MAX_SCAN_LIMIT: usize = 3000;
    pub const DEFAULT_SCAN_LIMIT: usize = 200;
    pub const DEFAULT_SCAN_WORKERS: usize = 10;

    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Required environment variable '{key}' is not set. Check your .env file."
                    ))
                })
        };

        let telegram_chat_id = required("TELEGRAM_CHAT_ID")?.parse::<i64>().map_err(|_| {
            Error::Config("TELEGRAM_CHAT_ID must be a numeric chat id".to_string())
        })?;

        Ok(Config {
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_chat_id,
            dashboard_port: lookup("DASHBOARD_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            scan_limit: clamp_scan_limit(
                lookup("SCAN_LIMIT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(Self::DEFAULT_SCAN_LIMIT),
            ),
            scan_workers: lookup("SCAN_WORKERS")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(Self::DEFAULT_SCAN_WORKERS),
            http_timeout_secs: lookup("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:market_sniper.db".to_string()),
            screen_config_path: lookup("SCREEN_CONFIG_PATH"),
        })
    }
}

/// Clamp a requested scan size into the range the dashboard offers.
pub fn clamp_scan_limit(limit: usize) -> usize {
    limit.clamp(Config::MIN_SCAN_LIMIT, Config::MAX_SCAN_LIMIT)
}
