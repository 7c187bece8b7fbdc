//! MACD: trend-difference oscillator with signal line and histogram.
//!
//! Line = EMA(fast) - EMA(slow); signal = EMA of the line over
//! `signal_period`; histogram = line - signal. The line is defined once
//! the slow EMA is, the signal `signal_period - 1` entries later.

use crate::domain::indicator::ema::ema;

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = closes.len();
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return MacdSeries {
            line: vec![None; n],
            signal: vec![None; n],
            histogram: vec![None; n],
        };
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // Signal is an EMA over the defined stretch of the line.
    let start = line.iter().position(|v| v.is_some()).unwrap_or(n);
    let defined: Vec<f64> = line[start..].iter().flatten().copied().collect();
    let signal_defined = ema(&defined, signal_period);

    let mut signal = vec![None; n];
    for (offset, value) in signal_defined.into_iter().enumerate() {
        signal[start + offset] = value;
    }

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| match (l, s) {
            (Some(l), Some(s)) => Some(l - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
