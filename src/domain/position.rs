//! Open positions and closed-trade records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::signal::Direction;

/// An open position. At most one exists per symbol at any time; it is
/// created on entry and destroyed on exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub entry_time: NaiveDateTime,
    pub rationale: String,
}

impl Position {
    /// Cash value at entry (quantity x entry price).
    pub fn notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Buy => (price - self.entry_price) * self.quantity,
            Direction::Sell => (self.entry_price - price) * self.quantity,
            Direction::Hold => 0.0,
        }
    }

    /// Entry notional plus unrealized P&L; what the position contributes
    /// to portfolio equity at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.notional() + self.unrealized_pnl(price)
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        let Some(stop) = self.stop_loss else {
            return false;
        };
        match self.direction {
            Direction::Buy => price <= stop,
            Direction::Sell => price >= stop,
            Direction::Hold => false,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        let Some(target) = self.take_profit else {
            return false;
        };
        match self.direction {
            Direction::Buy => price >= target,
            Direction::Sell => price <= target,
            Direction::Hold => false,
        }
    }
}

/// A closed-position snapshot; the trade ledger is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub quantity: f64,
    pub pnl: f64,
    pub exit_reason: String,
}

/// One portfolio-value sample of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}
