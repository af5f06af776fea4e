use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Screening thresholds. Every field has a default, so a TOML file only
/// needs the values it overrides.
///
/// Example `config/screen.toml`:
/// ```toml
/// min_bars = 200
///
/// [golden]
/// min_price = 30.0
/// min_avg_volume = 50000.0
/// rsi_low = 55.0
/// rsi_high = 75.0
///
/// [bottom]
/// max_rsi = 60.0
/// near_low_pct = 20.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Bars of history required before any strategy is evaluated.
    pub min_bars: usize,
    pub golden: GoldenParams,
    pub bottom: BottomParams,
}

/// Breakout thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GoldenParams {
    pub min_price: f64,
    pub min_avg_volume: f64,
    pub fast_sma: usize,
    pub slow_sma: usize,
    pub volume_sma: usize,
    pub rsi_period: usize,
    pub rsi_low: f64,
    pub rsi_high: f64,
    pub adx_period: usize,
    pub min_adx: f64,
    /// Latest volume over its average must be strictly above this.
    pub min_rel_volume: f64,
}

/// Bottom-fish thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BottomParams {
    pub ema_period: usize,
    pub rsi_period: usize,
    pub max_rsi: f64,
    /// Max percent above the one-year closing low.
    pub near_low_pct: f64,
    /// Max percent distance from the EMA.
    pub near_ema_pct: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            min_bars: 200,
            golden: GoldenParams::default(),
            bottom: BottomParams::default(),
        }
    }
}

impl Default for GoldenParams {
    fn default() -> Self {
        Self {
            min_price: 30.0,
            min_avg_volume: 50_000.0,
            fast_sma: 50,
            slow_sma: 200,
            volume_sma: 20,
            rsi_period: 14,
            rsi_low: 55.0,
            rsi_high: 75.0,
            adx_period: 14,
            min_adx: 25.0,
            min_rel_volume: 1.5,
        }
    }
}

impl Default for BottomParams {
    fn default() -> Self {
        Self {
            ema_period: 200,
            rsi_period: 14,
            max_rsi: 60.0,
            near_low_pct: 20.0,
            near_ema_pct: 3.0,
        }
    }
}

impl ScreenConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read screen config at '{path}': {e}"))
        })?;
        let cfg = Self::parse(&content).map_err(|e| {
            Error::Config(format!("Failed to parse screen config at '{path}': {e}"))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject thresholds the indicators cannot work with.
    pub fn validate(&self) -> Result<()> {
        let g = &self.golden;
        let b = &self.bottom;
        let periods = [
            ("golden.fast_sma", g.fast_sma, 1),
            ("golden.slow_sma", g.slow_sma, 1),
            ("golden.volume_sma", g.volume_sma, 1),
            ("golden.rsi_period", g.rsi_period, 2),
            ("golden.adx_period", g.adx_period, 2),
            ("bottom.ema_period", b.ema_period, 1),
            ("bottom.rsi_period", b.rsi_period, 2),
        ];
        for (name, value, min) in periods {
            if value < min {
                return Err(Error::Config(format!("{name} must be >= {min}, got {value}")));
            }
        }
        if self.min_bars == 0 {
            return Err(Error::Config("min_bars must be positive".to_string()));
        }
        if g.rsi_low > g.rsi_high {
            return Err(Error::Config(format!(
                "golden.rsi_low ({}) exceeds golden.rsi_high ({})",
                g.rsi_low, g.rsi_high
            )));
        }
        Ok(())
    }

    /// The built-in thresholds, or the overrides at `path` if one is given.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
