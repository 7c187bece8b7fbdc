//! Volume ratio and N-period return ratios.

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::sma;

/// Current volume divided by its trailing simple average. Undefined during
/// warm-up and when the trailing average is zero.
pub fn volume_ratio(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    sma(&volumes, period)
        .into_iter()
        .zip(&volumes)
        .map(|(avg, &vol)| match avg {
            Some(avg) if avg > 0.0 => Some(vol / avg),
            _ => None,
        })
        .collect()
}

/// N-period return ratio: close / close[n back] - 1. Undefined for the
/// first `period` entries and when the reference close is zero.
pub fn momentum(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            if i < period {
                return None;
            }
            let base = closes[i - period];
            if base != 0.0 {
                Some(close / base - 1.0)
            } else {
                None
            }
        })
        .collect()
}
