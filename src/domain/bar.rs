//! OHLCV bar representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One OHLCV sample for a fixed timeframe. Bar sequences are ordered by
/// strictly increasing timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// True when every timestamp strictly increases.
pub fn is_ordered(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(hour: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn typical_price() {
        let bar = make_bar(0, 100.0);
        let expected = (101.0 + 99.0 + 100.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn ordered_sequence() {
        let bars = vec![make_bar(0, 100.0), make_bar(1, 101.0), make_bar(2, 102.0)];
        assert!(is_ordered(&bars));
    }

    #[test]
    fn unordered_sequence_detected() {
        let bars = vec![make_bar(1, 100.0), make_bar(0, 101.0)];
        assert!(!is_ordered(&bars));
    }

    #[test]
    fn duplicate_timestamp_detected() {
        let bars = vec![make_bar(1, 100.0), make_bar(1, 101.0)];
        assert!(!is_ordered(&bars));
    }
}
