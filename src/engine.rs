//! Live decision loop: periodic signal fusion with risk gating, plus a
//! position-monitoring pass.
//!
//! The engine owns the open-positions map and the risk assessor
//! exclusively. Both [`TradingEngine::run_cycle`] and
//! [`TradingEngine::monitor_positions`] take `&mut self`, so a monitoring
//! check can never interleave with an entry decision for the same symbol:
//! the borrow checker serializes the two paths without a lock. All market
//! access goes through the [`MarketDataPort`] boundary; the engine itself
//! performs no I/O.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::domain::error::EngineError;
use crate::domain::indicator::annotate;
use crate::domain::params::StrategyParameters;
use crate::domain::position::{Position, TradeRecord};
use crate::domain::risk::{RiskAssessor, RiskLevel, RiskLimits, RiskSummary};
use crate::domain::signal::fusion::{fuse, TradingSignal};
use crate::domain::signal::{Direction, Generator};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub bar_count: usize,
}

impl EngineSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let symbols = config
            .get_string("engine", "symbols")
            .ok_or_else(|| EngineError::ConfigMissing {
                section: "engine".into(),
                key: "symbols".into(),
            })?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if symbols.is_empty() {
            return Err(EngineError::ConfigInvalid {
                section: "engine".into(),
                key: "symbols".into(),
                reason: "at least one symbol is required".into(),
            });
        }
        Ok(EngineSettings {
            symbols,
            timeframe: config
                .get_string("engine", "timeframe")
                .unwrap_or_else(|| "1h".to_string()),
            bar_count: config.get_int("engine", "bar_count", 500) as usize,
        })
    }
}

pub struct TradingEngine<'a, D: MarketDataPort> {
    data: &'a D,
    params: StrategyParameters,
    settings: EngineSettings,
    risk: RiskAssessor,
    positions: HashMap<String, Position>,
}

impl<'a, D: MarketDataPort> TradingEngine<'a, D> {
    pub fn new(data: &'a D, params: StrategyParameters, settings: EngineSettings) -> Self {
        let limits = RiskLimits {
            max_position_size: params.max_position_size,
            ..RiskLimits::default()
        };
        TradingEngine {
            data,
            params,
            settings,
            risk: RiskAssessor::new(limits),
            positions: HashMap::new(),
        }
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Feed an externally realized P&L sample into the risk window.
    pub fn record_daily_pnl(&mut self, pnl: f64) {
        self.risk.record_daily_pnl(pnl);
    }

    pub fn risk_summary(&self) -> Result<RiskSummary, EngineError> {
        Ok(self.risk.summary(self.portfolio_value()?))
    }

    fn portfolio_value(&self) -> Result<f64, EngineError> {
        let balance = self.data.get_balance()?;
        let open_value: f64 = self.positions.values().map(|p| p.notional()).sum();
        Ok(balance + open_value)
    }

    /// One decision pass over all configured symbols: fuse opinions and
    /// open a paper position where the signal clears the risk gate.
    /// Returns the signals actually acted on.
    pub fn run_cycle(&mut self) -> Result<Vec<TradingSignal>, EngineError> {
        let mut executed = Vec::new();

        for symbol in self.settings.symbols.clone() {
            if self.positions.contains_key(&symbol) {
                debug!(component = "engine", symbol = %symbol, "position open, skipping entry");
                continue;
            }

            let bars =
                self.data
                    .get_bars(&symbol, &self.settings.timeframe, self.settings.bar_count)?;
            if bars.len() <= self.params.warmup() {
                warn!(
                    component = "engine",
                    symbol = %symbol,
                    bars = bars.len(),
                    needed = self.params.warmup() + 1,
                    "insufficient history, holding"
                );
                continue;
            }

            let snapshots = annotate(&bars, &self.params);
            let Some(snapshot) = snapshots.last() else {
                continue;
            };
            let price = self.data.get_current_price(&symbol)?;
            let timestamp = bars[bars.len() - 1].timestamp;

            let opinions = Generator::evaluate_all(snapshot, price, &self.params);
            let Some(signal) = fuse(&opinions, &symbol, price, timestamp, &self.params) else {
                continue;
            };

            let balance = self.data.get_balance()?;
            let portfolio_value = self.portfolio_value()?;
            let proposed_quantity = balance * signal.position_size / price;
            let assessment = self.risk.assess_trade(
                &symbol,
                signal.direction,
                proposed_quantity,
                price,
                portfolio_value,
            );

            if assessment.risk_level == RiskLevel::Critical
                || assessment.max_new_position_size <= 0.0
            {
                warn!(
                    component = "engine",
                    symbol = %symbol,
                    risk_score = assessment.risk_score,
                    level = %assessment.risk_level,
                    "entry vetoed by risk assessment"
                );
                continue;
            }

            let position_size = signal.position_size.min(assessment.max_new_position_size);
            let quantity = balance * position_size / price;
            if quantity <= 0.0 {
                continue;
            }

            self.positions.insert(
                symbol.clone(),
                Position {
                    symbol: symbol.clone(),
                    direction: signal.direction,
                    entry_price: price,
                    quantity,
                    stop_loss: signal.stop_loss,
                    take_profit: signal.take_profit,
                    entry_time: timestamp,
                    rationale: signal.rationale.clone(),
                },
            );
            self.risk.record_position(&symbol, quantity, price);

            info!(
                component = "engine",
                symbol = %symbol,
                direction = %signal.direction,
                quantity,
                price,
                "entered position"
            );
            executed.push(TradingSignal {
                position_size,
                ..signal
            });
        }

        Ok(executed)
    }

    /// One monitoring pass over open positions: stop loss, take profit,
    /// then opposing fusion signal, in that order. Returns closed trades.
    pub fn monitor_positions(&mut self) -> Result<Vec<TradeRecord>, EngineError> {
        let mut closed = Vec::new();
        let symbols: Vec<String> = self.positions.keys().cloned().collect();

        for symbol in symbols {
            let Some(position) = self.positions.get(&symbol) else {
                continue;
            };
            let price = self.data.get_current_price(&symbol)?;

            let mut exit_reason = if position.should_stop_loss(price) {
                Some("stop loss hit".to_string())
            } else if position.should_take_profit(price) {
                Some("take profit hit".to_string())
            } else {
                None
            };

            let bars =
                self.data
                    .get_bars(&symbol, &self.settings.timeframe, self.settings.bar_count)?;
            let timestamp = bars
                .last()
                .map(|b| b.timestamp)
                .unwrap_or(position.entry_time);

            if exit_reason.is_none() && bars.len() > self.params.warmup() {
                let snapshots = annotate(&bars, &self.params);
                if let Some(snapshot) = snapshots.last() {
                    let opinions = Generator::evaluate_all(snapshot, price, &self.params);
                    if let Some(signal) = fuse(&opinions, &symbol, price, timestamp, &self.params) {
                        let opposing = matches!(
                            (position.direction, signal.direction),
                            (Direction::Buy, Direction::Sell) | (Direction::Sell, Direction::Buy)
                        );
                        if opposing {
                            exit_reason = Some(format!("exit signal: {}", signal.rationale));
                        }
                    }
                }
            }

            if let Some(reason) = exit_reason {
                if let Some(position) = self.positions.remove(&symbol) {
                    let pnl = position.unrealized_pnl(price);
                    self.risk.record_daily_pnl(pnl);
                    info!(
                        component = "engine",
                        symbol = %symbol,
                        pnl,
                        reason = reason.as_str(),
                        "closed position"
                    );
                    closed.push(TradeRecord {
                        symbol: position.symbol.clone(),
                        direction: position.direction,
                        entry_price: position.entry_price,
                        exit_price: price,
                        entry_time: position.entry_time,
                        exit_time: timestamp,
                        quantity: position.quantity,
                        pnl,
                        exit_reason: reason,
                    });
                }
            }
        }

        Ok(closed)
    }
}
