//! Stochastic oscillator (%K/%D) and Williams %R.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over the
//! lookback window, smoothed into %D with an SMA. Williams %R is the same
//! range flipped to [-100, 0]. A flat window (highest == lowest) yields the
//! midpoint (50 / -50) rather than dividing by zero.

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::sma;

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
    pub williams_r: Vec<Option<f64>>,
}

pub fn stochastic(bars: &[Bar], period: usize, smooth: usize) -> StochasticSeries {
    let n = bars.len();
    if period == 0 || smooth == 0 {
        return StochasticSeries {
            k: vec![None; n],
            d: vec![None; n],
            williams_r: vec![None; n],
        };
    }

    let mut k = vec![None; n];
    let mut williams_r = vec![None; n];

    for i in 0..n {
        if i + 1 < period {
            continue;
        }
        let window = &bars[i + 1 - period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        if highest == lowest {
            k[i] = Some(50.0);
            williams_r[i] = Some(-50.0);
        } else {
            let close = bars[i].close;
            k[i] = Some(100.0 * (close - lowest) / (highest - lowest));
            williams_r[i] = Some(-100.0 * (highest - close) / (highest - lowest));
        }
    }

    // %D smooths the defined stretch of %K.
    let start = k.iter().position(|v| v.is_some()).unwrap_or(n);
    let defined: Vec<f64> = k[start..].iter().flatten().copied().collect();
    let d_defined = sma(&defined, smooth);

    let mut d = vec![None; n];
    for (offset, value) in d_defined.into_iter().enumerate() {
        d[start + offset] = value;
    }

    StochasticSeries { k, d, williams_r }
}
