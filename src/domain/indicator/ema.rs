//! Simple and exponential moving averages.
//!
//! Both return one entry per input value; entries before the warm-up
//! window are `None`, never zero. The EMA seeds with the simple average
//! of the first `period` values, then applies the standard recursion
//! `ema = (value - prev) * alpha + prev` with `alpha = 2 / (period + 1)`.

pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        match state {
            None => {
                seed_sum += v;
                if i + 1 == period {
                    state = Some(seed_sum / period as f64);
                }
            }
            Some(prev) => {
                state = Some((v - prev) * alpha + prev);
            }
        }
        out.push(state);
    }
    out
}
