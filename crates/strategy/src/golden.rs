use common::{
    strip_exchange_suffix, Evaluation, MatchRecord, Metric, PriceSeries, Rejection, ScanStrategy,
    SECTOR_UNKNOWN,
};

use crate::config::{GoldenParams, ScreenConfig};
use crate::indicators::{sma, AdxIndicator, RsiIndicator};
use crate::{round_to, Screener};

/// Indicator values on the latest bar, as the breakout gates see them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutSnapshot {
    pub close: f64,
    pub volume: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub rsi: f64,
    pub adx: f64,
    pub volume_sma: f64,
}

impl BreakoutSnapshot {
    /// Compute every indicator the gates need. `None` if any is undefined.
    pub fn from_series(series: &PriceSeries, params: &GoldenParams) -> Option<Self> {
        let last = series.last()?;
        let closes = series.closes();
        let volumes = series.volumes();

        let snapshot = Self {
            close: last.close,
            volume: last.volume,
            sma_fast: sma(&closes, params.fast_sma)?,
            sma_slow: sma(&closes, params.slow_sma)?,
            rsi: RsiIndicator::new(params.rsi_period).compute(&closes)?,
            adx: AdxIndicator::new(params.adx_period).compute(
                &series.highs(),
                &series.lows(),
                &closes,
            )?,
            volume_sma: sma(&volumes, params.volume_sma)?,
        };
        snapshot.is_finite().then_some(snapshot)
    }

    fn is_finite(&self) -> bool {
        [
            self.close,
            self.volume,
            self.sma_fast,
            self.sma_slow,
            self.rsi,
            self.adx,
            self.volume_sma,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    pub fn relative_volume(&self) -> f64 {
        self.volume / self.volume_sma
    }
}

/// Breakout screen: liquid names in a stacked uptrend with a volume surge,
/// healthy momentum and a trending ADX.
#[derive(Debug, Clone)]
pub struct GoldenScreen {
    min_bars: usize,
    params: GoldenParams,
}

impl GoldenScreen {
    pub fn new(cfg: &ScreenConfig) -> Self {
        Self {
            min_bars: cfg.min_bars,
            params: cfg.golden.clone(),
        }
    }

    /// Apply the gates to precomputed indicator values.
    pub fn judge(&self, symbol: &str, snap: &BreakoutSnapshot) -> Evaluation {
        let p = &self.params;

        if snap.close < p.min_price {
            return Evaluation::NoMatch(Rejection::BelowPriceFloor);
        }
        if snap.volume_sma < p.min_avg_volume {
            return Evaluation::NoMatch(Rejection::Illiquid);
        }
        if !(snap.close > snap.sma_fast && snap.sma_fast > snap.sma_slow) {
            return Evaluation::NoMatch(Rejection::TrendNotStacked);
        }
        let rel_vol = snap.relative_volume();
        if !(rel_vol > p.min_rel_volume) {
            return Evaluation::NoMatch(Rejection::NoVolumeSurge);
        }
        if !(p.rsi_low..=p.rsi_high).contains(&snap.rsi) {
            return Evaluation::NoMatch(Rejection::RsiOutOfBand);
        }
        if snap.adx < p.min_adx {
            return Evaluation::NoMatch(Rejection::WeakTrend);
        }

        Evaluation::Match(MatchRecord {
            symbol: strip_exchange_suffix(symbol).to_string(),
            price: round_to(snap.close, 2),
            score: ScanStrategy::Golden.score_label().to_string(),
            sector: SECTOR_UNKNOWN.to_string(),
            metric: Metric::RelVolume(round_to(rel_vol, 1)),
        })
    }
}

impl Screener for GoldenScreen {
    fn strategy(&self) -> ScanStrategy {
        ScanStrategy::Golden
    }

    fn evaluate(&self, series: &PriceSeries) -> Evaluation {
        if series.len() < self.min_bars {
            return Evaluation::NoMatch(Rejection::InsufficientHistory { bars: series.len() });
        }
        // Cheap price floor before any indicator work
        match series.last() {
            Some(last) if last.close >= self.params.min_price => {}
            Some(_) => return Evaluation::NoMatch(Rejection::BelowPriceFloor),
            None => return Evaluation::NoMatch(Rejection::InsufficientHistory { bars: 0 }),
        }
        match BreakoutSnapshot::from_series(series, &self.params) {
            Some(snap) => self.judge(&series.symbol, &snap),
            None => Evaluation::NoMatch(Rejection::IndicatorUndefined),
        }
    }
}
