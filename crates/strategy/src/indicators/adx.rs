/// ADX (Average Directional Index) indicator, Wilder's formulation.
///
/// True range and directional movement are Wilder-smoothed over `period`
/// bars to get +DI/-DI; DX is then averaged (seeded with a plain mean of the
/// first `period` DX values) to produce ADX. Needs `2 * period` bars.
#[derive(Debug, Clone)]
pub struct AdxIndicator {
    pub period: usize,
}

impl AdxIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "ADX period must be >= 2");
        Self { period }
    }

    /// Compute ADX of the latest bar. Slices must be the same length, oldest first.
    pub fn compute(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> Option<f64> {
        let n = closes.len();
        if highs.len() != n || lows.len() != n || n < 2 * self.period {
            return None;
        }
        let p = self.period as f64;

        let mut tr = Vec::with_capacity(n - 1);
        let mut plus_dm = Vec::with_capacity(n - 1);
        let mut minus_dm = Vec::with_capacity(n - 1);
        for i in 1..n {
            let up = highs[i] - highs[i - 1];
            let down = lows[i - 1] - lows[i];
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
            tr.push(
                (highs[i] - lows[i])
                    .max((highs[i] - closes[i - 1]).abs())
                    .max((lows[i] - closes[i - 1]).abs()),
            );
        }

        // Wilder running sums, seeded with the plain sum of the first window
        let mut s_tr: f64 = tr[..self.period].iter().sum();
        let mut s_plus: f64 = plus_dm[..self.period].iter().sum();
        let mut s_minus: f64 = minus_dm[..self.period].iter().sum();

        let mut dx = Vec::with_capacity(tr.len() - self.period + 1);
        dx.push(directional_index(s_tr, s_plus, s_minus)?);
        for i in self.period..tr.len() {
            s_tr = s_tr - s_tr / p + tr[i];
            s_plus = s_plus - s_plus / p + plus_dm[i];
            s_minus = s_minus - s_minus / p + minus_dm[i];
            dx.push(directional_index(s_tr, s_plus, s_minus)?);
        }

        if dx.len() < self.period {
            return None;
        }
        let mut adx = dx[..self.period].iter().sum::<f64>() / p;
        for &value in &dx[self.period..] {
            adx = (adx * (p - 1.0) + value) / p;
        }
        adx.is_finite().then_some(adx)
    }
}

/// DX from smoothed true range and directional movement.
/// `None` when the range is zero (DI undefined).
fn directional_index(s_tr: f64, s_plus: f64, s_minus: f64) -> Option<f64> {
    if s_tr <= 0.0 || !s_tr.is_finite() {
        return None;
    }
    let plus_di = 100.0 * s_plus / s_tr;
    let minus_di = 100.0 * s_minus / s_tr;
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        return Some(0.0);
    }
    Some(100.0 * (plus_di - minus_di).abs() / sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64], spread: f64) -> (Vec<f64>, Vec<f64>) {
        (
            closes.iter().map(|c| c + spread).collect(),
            closes.iter().map(|c| c - spread).collect(),
        )
    }

    #[test]
    fn adx_none_when_insufficient_data() {
        let adx = AdxIndicator::new(14);
        let closes = vec![100.0; 27];
        let (h, l) = bars(&closes, 1.0);
        assert!(adx.compute(&h, &l, &closes).is_none());
    }

    #[test]
    fn adx_high_on_steady_trend() {
        let adx = AdxIndicator::new(14);
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 2.0).collect();
        let (h, l) = bars(&closes, 0.5);
        let v = adx.compute(&h, &l, &closes).unwrap();
        assert!(v > 90.0, "ADX on a straight line should be near 100, got {v}");
    }

    #[test]
    fn adx_low_on_sideways_chop() {
        let adx = AdxIndicator::new(14);
        let closes: Vec<f64> = (0..80)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let (h, l) = bars(&closes, 0.5);
        let v = adx.compute(&h, &l, &closes).unwrap();
        assert!(v < 25.0, "ADX on chop should be low, got {v}");
    }

    #[test]
    fn adx_none_on_zero_range() {
        let adx = AdxIndicator::new(14);
        let closes = vec![100.0; 40];
        assert!(adx.compute(&closes, &closes, &closes).is_none());
    }

    #[test]
    fn adx_rejects_mismatched_lengths() {
        let adx = AdxIndicator::new(3);
        assert!(adx.compute(&[1.0; 10], &[1.0; 9], &[1.0; 10]).is_none());
    }
}
