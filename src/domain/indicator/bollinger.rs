//! Bollinger Bands: volatility band triplet plus relative width.
//!
//! Middle = SMA(period); upper/lower = middle ± std_mult * population
//! standard deviation over the same window; width = (upper - lower) /
//! middle, undefined when the middle band is zero.

use crate::domain::indicator::ema::sma;

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub width: Vec<Option<f64>>,
}

pub fn bollinger(closes: &[f64], period: usize, std_mult: f64) -> BollingerSeries {
    let n = closes.len();
    if period == 0 {
        return BollingerSeries {
            upper: vec![None; n],
            middle: vec![None; n],
            lower: vec![None; n],
            width: vec![None; n],
        };
    }

    let middle = sma(closes, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut width = vec![None; n];

    for i in 0..n {
        let Some(mean) = middle[i] else { continue };
        let window = &closes[i + 1 - period..=i];
        let variance =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        let u = mean + std_mult * std;
        let l = mean - std_mult * std;
        upper[i] = Some(u);
        lower[i] = Some(l);
        width[i] = if mean != 0.0 { Some((u - l) / mean) } else { None };
    }

    BollingerSeries {
        upper,
        middle,
        lower,
        width,
    }
}
