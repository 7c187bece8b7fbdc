#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::Cell;
use std::collections::HashMap;

use confluence::domain::bar::Bar;
use confluence::domain::error::EngineError;
use confluence::ports::data_port::MarketDataPort;

pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn bar(i: usize, close: f64) -> Bar {
    Bar {
        timestamp: epoch() + chrono::Duration::hours(i as i64),
        open: close,
        high: close * 1.005,
        low: close * 0.995,
        close,
        volume: 1000.0,
    }
}

/// Monotonic series: close grows `rate` per bar.
pub fn trending_bars(n: usize, rate: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| bar(i, 100.0 * (1.0 + rate).powi(i as i32)))
        .collect()
}

/// Flat series with constant close and volume.
pub fn flat_bars(n: usize) -> Vec<Bar> {
    (0..n).map(|i| bar(i, 100.0)).collect()
}

pub struct MockDataPort {
    pub bars: HashMap<String, Vec<Bar>>,
    pub price_override: Cell<Option<f64>>,
    pub balance: f64,
}

impl MockDataPort {
    pub fn new(balance: f64) -> Self {
        MockDataPort {
            bars: HashMap::new(),
            price_override: Cell::new(None),
            balance,
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn get_bars(
        &self,
        symbol: &str,
        _timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>, EngineError> {
        let bars = self.bars.get(symbol).ok_or_else(|| EngineError::Data {
            reason: format!("no bars for {symbol}"),
        })?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn get_current_price(&self, symbol: &str) -> Result<f64, EngineError> {
        if let Some(price) = self.price_override.get() {
            return Ok(price);
        }
        self.bars
            .get(symbol)
            .and_then(|bars| bars.last())
            .map(|b| b.close)
            .ok_or_else(|| EngineError::Data {
                reason: format!("no price for {symbol}"),
            })
    }

    fn get_balance(&self) -> Result<f64, EngineError> {
        Ok(self.balance)
    }
}
