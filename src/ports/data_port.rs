//! Market data access port trait.
//!
//! The engine core performs no network or disk I/O; bars, quotes and the
//! account balance all arrive through this boundary.

use crate::domain::bar::Bar;
use crate::domain::error::EngineError;

pub trait MarketDataPort {
    /// The most recent `count` bars for `symbol` at `timeframe`, ordered
    /// by strictly increasing timestamp.
    fn get_bars(&self, symbol: &str, timeframe: &str, count: usize)
        -> Result<Vec<Bar>, EngineError>;

    fn get_current_price(&self, symbol: &str) -> Result<f64, EngineError>;

    fn get_balance(&self) -> Result<f64, EngineError>;
}
