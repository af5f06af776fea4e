use common::{
    strip_exchange_suffix, Evaluation, MatchRecord, Metric, PriceSeries, Rejection, ScanStrategy,
    SECTOR_UNKNOWN,
};

use crate::config::{BottomParams, ScreenConfig};
use crate::indicators::{ema, RsiIndicator};
use crate::{round_to, Screener};

/// Indicator values on the latest bar for the bottom-fish gates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BottomSnapshot {
    pub close: f64,
    /// `None` when the series is too short for the EMA.
    pub ema: Option<f64>,
    pub rsi: f64,
    /// Lowest close over the whole series (one trading year).
    pub year_low: f64,
}

impl BottomSnapshot {
    pub fn from_series(series: &PriceSeries, params: &BottomParams) -> Option<Self> {
        let last = series.last()?;
        let closes = series.closes();
        let year_low = closes.iter().copied().fold(f64::INFINITY, f64::min);

        let snapshot = Self {
            close: last.close,
            ema: ema(&closes, params.ema_period),
            rsi: RsiIndicator::new(params.rsi_period).compute(&closes)?,
            year_low,
        };
        let defined = snapshot.close.is_finite()
            && snapshot.rsi.is_finite()
            && snapshot.year_low.is_finite()
            && snapshot.year_low > 0.0;
        defined.then_some(snapshot)
    }

    /// Percent the close sits above the yearly low.
    pub fn dist_from_low_pct(&self) -> f64 {
        (self.close / self.year_low - 1.0) * 100.0
    }

    /// Absolute percent distance from the EMA, if the EMA is defined.
    pub fn dist_from_ema_pct(&self) -> Option<f64> {
        self.ema
            .filter(|e| e.is_finite() && *e != 0.0)
            .map(|e| (self.close - e).abs() / e * 100.0)
    }
}

/// Bottom-fish screen: names close to their yearly low or hugging the
/// long-term EMA, provided momentum is not overbought.
#[derive(Debug, Clone)]
pub struct BottomScreen {
    min_bars: usize,
    params: BottomParams,
}

impl BottomScreen {
    pub fn new(cfg: &ScreenConfig) -> Self {
        Self {
            min_bars: cfg.min_bars,
            params: cfg.bottom.clone(),
        }
    }

    pub fn judge(&self, symbol: &str, snap: &BottomSnapshot) -> Evaluation {
        let p = &self.params;
        let dist_low = snap.dist_from_low_pct();

        let near_bottom = dist_low <= p.near_low_pct;
        let near_ema = snap
            .dist_from_ema_pct()
            .is_some_and(|d| d <= p.near_ema_pct);

        if !(near_bottom || near_ema) {
            return Evaluation::NoMatch(Rejection::FarFromSupport);
        }
        if snap.rsi > p.max_rsi {
            return Evaluation::NoMatch(Rejection::Overbought);
        }

        Evaluation::Match(MatchRecord {
            symbol: strip_exchange_suffix(symbol).to_string(),
            price: round_to(snap.close, 2),
            score: ScanStrategy::Bottom.score_label().to_string(),
            sector: SECTOR_UNKNOWN.to_string(),
            metric: Metric::DistFromLow(round_to(dist_low, 1)),
        })
    }
}

impl Screener for BottomScreen {
    fn strategy(&self) -> ScanStrategy {
        ScanStrategy::Bottom
    }

    fn evaluate(&self, series: &PriceSeries) -> Evaluation {
        if series.len() < self.min_bars {
            return Evaluation::NoMatch(Rejection::InsufficientHistory { bars: series.len() });
        }
        match BottomSnapshot::from_series(series, &self.params) {
            Some(snap) => self.judge(&series.symbol, &snap),
            None => Evaluation::NoMatch(Rejection::IndicatorUndefined),
        }
    }
}
