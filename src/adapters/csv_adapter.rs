//! CSV file market-data adapter.
//!
//! One file per symbol and timeframe at `{base}/{symbol}_{timeframe}.csv`
//! with a header row and columns timestamp, open, high, low, close,
//! volume. Timestamps use `%Y-%m-%d %H:%M:%S`.

use chrono::NaiveDateTime;
use std::path::PathBuf;

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::ports::data_port::MarketDataPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvBarAdapter {
    base_path: PathBuf,
    balance: f64,
}

impl CsvBarAdapter {
    pub fn new(base_path: PathBuf, balance: f64) -> Self {
        Self { base_path, balance }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}_{timeframe}.csv"))
    }

    fn read_all(&self, symbol: &str, timeframe: &str) -> Result<Vec<Bar>, EngineError> {
        let path = self.csv_path(symbol, timeframe);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| EngineError::Data {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| EngineError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let timestamp = NaiveDateTime::parse_from_str(
                field(&record, 0, "timestamp")?,
                TIMESTAMP_FORMAT,
            )
            .map_err(|e| EngineError::Data {
                reason: format!("invalid timestamp: {e}"),
            })?;

            bars.push(Bar {
                timestamp,
                open: number(&record, 1, "open")?,
                high: number(&record, 2, "high")?,
                low: number(&record, 3, "low")?,
                close: number(&record, 4, "close")?,
                volume: number(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'a str, EngineError> {
    record.get(index).ok_or_else(|| EngineError::Data {
        reason: format!("missing {name} column"),
    })
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, EngineError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| EngineError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl MarketDataPort for CsvBarAdapter {
    fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Bar>, EngineError> {
        let bars = self.read_all(symbol, timeframe)?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn get_current_price(&self, symbol: &str) -> Result<f64, EngineError> {
        let bars = self.read_all(symbol, "1h")?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| EngineError::Data {
                reason: format!("no bars for {symbol}"),
            })
    }

    fn get_balance(&self) -> Result<f64, EngineError> {
        Ok(self.balance)
    }
}
