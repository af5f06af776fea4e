pub mod bottom;
pub mod config;
pub mod golden;
pub mod indicators;
pub mod registry;

pub use bottom::{BottomScreen, BottomSnapshot};
pub use config::{BottomParams, GoldenParams, ScreenConfig};
pub use golden::{BreakoutSnapshot, GoldenScreen};
pub use registry::ScreenerRegistry;

use common::{Evaluation, PriceSeries, ScanStrategy};

/// A rule set that scores one symbol's history.
///
/// Implementations are pure: no I/O, no shared mutable state. Anything that
/// cannot be computed is reported as [`Evaluation::NoMatch`], never a panic
/// or an error.
pub trait Screener: Send + Sync {
    fn strategy(&self) -> ScanStrategy;

    /// Score the latest bar of `series`.
    fn evaluate(&self, series: &PriceSeries) -> Evaluation;
}

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
