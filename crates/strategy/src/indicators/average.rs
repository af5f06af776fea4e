/// Simple moving average of the last `period` values in `data`.
/// Returns `None` if there isn't enough data or the window holds a non-finite value.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    mean.is_finite().then_some(mean)
}

/// Exponential moving average of the latest value in `data`.
///
/// Seeded with the SMA of the first `period` values, then smoothed with
/// `k = 2 / (period + 1)` over everything after. Needs at least `period` values.
pub fn ema(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema_val: f64 = data[..period].iter().sum::<f64>() / period as f64;

    for &price in &data[period..] {
        ema_val = price * k + ema_val * (1.0 - k);
    }
    ema_val.is_finite().then_some(ema_val)
}
