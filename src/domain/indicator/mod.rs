//! Indicator pipeline: annotates a bar series with per-bar snapshots.
//!
//! Every field of [`IndicatorSnapshot`] is an `Option`: `None` means the
//! trailing window is still warming up (or the value is mathematically
//! undefined, e.g. a zero-width band). Undefined is never represented as
//! zero, and the pipeline never panics regardless of input length.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod volume;

use crate::domain::bar::Bar;
use crate::domain::params::StrategyParameters;

/// Return-ratio horizons, matching the short/medium momentum reads the
/// generators consume.
const MOMENTUM_SHORT: usize = 5;
const MOMENTUM_LONG: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub bb_position: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub williams_r: Option<f64>,
    pub momentum_5: Option<f64>,
    pub momentum_10: Option<f64>,
}

/// Compute one snapshot per bar. Prefix values are identical to what a
/// bar-by-bar recomputation over growing prefixes would produce, so the
/// backtest replay and the live path (which reads the last snapshot) stay
/// in agreement.
pub fn annotate(bars: &[Bar], params: &StrategyParameters) -> Vec<IndicatorSnapshot> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi = rsi::rsi(&closes, params.rsi_period);
    let macd = macd::macd(&closes, params.ema_fast, params.ema_slow, params.macd_signal);
    let bands = bollinger::bollinger(&closes, params.bb_period, params.bb_std);
    let ema_fast = ema::ema(&closes, params.ema_fast);
    let ema_slow = ema::ema(&closes, params.ema_slow);
    let volume_ratio = volume::volume_ratio(bars, params.volume_ma_period);
    let stoch = stochastic::stochastic(bars, params.stoch_period, params.stoch_smooth);
    let momentum_5 = volume::momentum(&closes, MOMENTUM_SHORT);
    let momentum_10 = volume::momentum(&closes, MOMENTUM_LONG);

    (0..bars.len())
        .map(|i| {
            let bb_position = match (bands.upper[i], bands.lower[i]) {
                (Some(upper), Some(lower)) if upper > lower => {
                    Some((closes[i] - lower) / (upper - lower))
                }
                _ => None,
            };
            IndicatorSnapshot {
                rsi: rsi[i],
                macd: macd.line[i],
                macd_signal: macd.signal[i],
                macd_histogram: macd.histogram[i],
                bb_upper: bands.upper[i],
                bb_middle: bands.middle[i],
                bb_lower: bands.lower[i],
                bb_width: bands.width[i],
                bb_position,
                ema_fast: ema_fast[i],
                ema_slow: ema_slow[i],
                volume_ratio: volume_ratio[i],
                stoch_k: stoch.k[i],
                stoch_d: stoch.d[i],
                williams_r: stoch.williams_r[i],
                momentum_5: momentum_5[i],
                momentum_10: momentum_10[i],
            }
        })
        .collect()
}
