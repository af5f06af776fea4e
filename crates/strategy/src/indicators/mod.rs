pub mod adx;
pub mod average;
pub mod rsi;

pub use adx::AdxIndicator;
pub use average::{ema, sma};
pub use rsi::RsiIndicator;
