//! RSI (Relative Strength Index), 0-100 bounded oscillator.
//!
//! Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first `period` changes
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss == 0.
//! The first `period` entries are undefined (a window of `period` price
//! changes needs `period + 1` bars).

pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut out = Vec::with_capacity(closes.len());
    out.push(None);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            out.push(None);
            continue;
        }

        if i == period {
            avg_gain = (avg_gain + gain) / period as f64;
            avg_loss = (avg_loss + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        out.push(Some(value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out.len(), 20);
        for (i, v) in out.iter().enumerate().take(14) {
            assert!(v.is_none(), "entry {} should be undefined", i);
        }
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_all_gains_is_hundred() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[14], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        assert!(out[14].unwrap() < 1e-9);
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 7) % 13) as f64 - 6.0)
            .collect();
        for v in rsi(&closes, 14).iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_zero_period_all_undefined() {
        let out = rsi(&[1.0, 2.0, 3.0], 0);
        assert!(out.iter().all(|v| v.is_none()));
    }
}
