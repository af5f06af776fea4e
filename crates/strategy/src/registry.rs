use std::sync::Arc;

use tracing::info;

use common::ScanStrategy;

use crate::config::ScreenConfig;
use crate::{BottomScreen, GoldenScreen, Screener};

/// Holds one screener per strategy, built from the same thresholds.
#[derive(Clone)]
pub struct ScreenerRegistry {
    golden: Arc<GoldenScreen>,
    bottom: Arc<BottomScreen>,
}

impl ScreenerRegistry {
    pub fn from_config(cfg: &ScreenConfig) -> Self {
        info!(
            min_bars = cfg.min_bars,
            min_price = cfg.golden.min_price,
            min_avg_volume = cfg.golden.min_avg_volume,
            "Screeners configured"
        );
        Self {
            golden: Arc::new(GoldenScreen::new(cfg)),
            bottom: Arc::new(BottomScreen::new(cfg)),
        }
    }

    pub fn get(&self, strategy: ScanStrategy) -> Arc<dyn Screener> {
        match strategy {
            ScanStrategy::Golden => self.golden.clone(),
            ScanStrategy::Bottom => self.bottom.clone(),
        }
    }
}

impl Default for ScreenerRegistry {
    fn default() -> Self {
        Self::from_config(&ScreenConfig::default())
    }
}
