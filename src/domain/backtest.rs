//! Backtest simulator: replays a bar series through the same indicator,
//! fusion and exit logic the live path uses.
//!
//! Per-symbol state machine Flat -> Open -> Flat. Exits are checked in
//! priority order: stop loss, take profit, opposing fusion signal, end of
//! data. Entries deduct the position notional from the balance; exits
//! return it together with realized P&L, so the ledger reconciles exactly:
//! sum of trade P&L equals final balance minus initial capital once every
//! position is closed.

use tracing::{debug, info};

use crate::domain::bar::{is_ordered, Bar};
use crate::domain::error::EngineError;
use crate::domain::indicator::annotate;
use crate::domain::metrics::{
    self, calmar_ratio, max_drawdown, monthly_returns, sharpe_ratio, PerformanceMetrics,
};
use crate::domain::params::StrategyParameters;
use crate::domain::position::{EquityPoint, Position, TradeRecord};
use crate::domain::signal::fusion::{fuse, TradingSignal};
use crate::domain::signal::{Direction, Generator};
use serde::{Deserialize, Serialize};

pub const END_OF_BACKTEST: &str = "end of backtest";

/// Full outcome of one simulator run. Field names are part of the
/// serialized interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_return: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub monthly_returns: Vec<f64>,
    pub strategy_parameters: StrategyParameters,
    pub performance_metrics: PerformanceMetrics,
}

/// Replay `bars` for `symbol` under `params`, starting from
/// `initial_capital`. Fails with `InsufficientData` when the series does
/// not cover the warm-up window, and `Data` when timestamps are not
/// strictly increasing.
pub fn run_backtest(
    symbol: &str,
    bars: &[Bar],
    params: &StrategyParameters,
    initial_capital: f64,
) -> Result<BacktestResult, EngineError> {
    params.validate()?;
    if initial_capital <= 0.0 {
        return Err(EngineError::InvalidParameters {
            reason: "initial capital must be positive".into(),
        });
    }
    if !is_ordered(bars) {
        return Err(EngineError::Data {
            reason: format!("bars for {symbol} are not strictly ordered by timestamp"),
        });
    }

    let warmup = params.warmup();
    if bars.len() <= warmup {
        return Err(EngineError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum: warmup + 1,
        });
    }

    debug!(
        component = "backtest",
        symbol,
        bars = bars.len(),
        warmup,
        "starting replay"
    );

    let snapshots = annotate(bars, params);

    let mut balance = initial_capital;
    let mut position: Option<Position> = None;
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_curve = vec![EquityPoint {
        timestamp: bars[warmup - 1].timestamp,
        equity: initial_capital,
    }];

    for i in warmup..bars.len() {
        let bar = &bars[i];
        let price = bar.close;

        let opinions = Generator::evaluate_all(&snapshots[i], price, params);
        let signal = fuse(&opinions, symbol, price, bar.timestamp, params);

        if let Some(open) = position.take() {
            match exit_reason(&open, price, signal.as_ref()) {
                Some(reason) => {
                    let pnl = open.unrealized_pnl(price);
                    balance += open.notional() + pnl;
                    trades.push(close_trade(open, price, bar, pnl, reason));
                }
                None => position = Some(open),
            }
        }

        // No entries on the final bar: they would be force-closed at the
        // same price and timestamp immediately after the loop.
        if position.is_none() && i + 1 < bars.len() {
            if let Some(signal) = &signal {
                position = open_position(&mut balance, signal, price, bar);
            }
        }

        let equity = balance
            + position
                .as_ref()
                .map(|p| p.market_value(price))
                .unwrap_or(0.0);
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
        });
    }

    if let Some(open) = position.take() {
        let last = &bars[bars.len() - 1];
        let price = last.close;
        let pnl = open.unrealized_pnl(price);
        balance += open.notional() + pnl;
        trades.push(close_trade(open, price, last, pnl, END_OF_BACKTEST.to_string()));
    }

    let total_return = (balance - initial_capital) / initial_capital * 100.0;
    let max_dd = max_drawdown(&equity_curve);
    let result = BacktestResult {
        total_return,
        total_trades: trades.len(),
        win_rate: metrics::win_rate(&trades),
        profit_factor: metrics::profit_factor(&trades),
        max_drawdown: max_dd,
        sharpe_ratio: sharpe_ratio(&equity_curve),
        calmar_ratio: calmar_ratio(total_return, max_dd),
        monthly_returns: monthly_returns(&equity_curve),
        performance_metrics: PerformanceMetrics::compute(&trades, total_return, max_dd),
        trades,
        equity_curve,
        strategy_parameters: params.clone(),
    };

    info!(
        component = "backtest",
        symbol,
        total_return = result.total_return,
        total_trades = result.total_trades,
        win_rate = result.win_rate,
        "replay finished"
    );

    Ok(result)
}

fn exit_reason(position: &Position, price: f64, signal: Option<&TradingSignal>) -> Option<String> {
    if position.should_stop_loss(price) {
        return Some("stop loss hit".to_string());
    }
    if position.should_take_profit(price) {
        return Some("take profit hit".to_string());
    }
    if let Some(signal) = signal {
        let opposing = matches!(
            (position.direction, signal.direction),
            (Direction::Buy, Direction::Sell) | (Direction::Sell, Direction::Buy)
        );
        if opposing {
            return Some(format!("exit signal: {}", signal.rationale));
        }
    }
    None
}

fn open_position(
    balance: &mut f64,
    signal: &TradingSignal,
    price: f64,
    bar: &Bar,
) -> Option<Position> {
    let notional = *balance * signal.position_size;
    if notional <= 0.0 || price <= 0.0 {
        return None;
    }
    let quantity = notional / price;
    *balance -= notional;
    Some(Position {
        symbol: signal.symbol.clone(),
        direction: signal.direction,
        entry_price: price,
        quantity,
        stop_loss: signal.stop_loss,
        take_profit: signal.take_profit,
        entry_time: bar.timestamp,
        rationale: signal.rationale.clone(),
    })
}

fn close_trade(
    position: Position,
    exit_price: f64,
    bar: &Bar,
    pnl: f64,
    exit_reason: String,
) -> TradeRecord {
    TradeRecord {
        symbol: position.symbol,
        direction: position.direction,
        entry_price: position.entry_price,
        exit_price,
        entry_time: position.entry_time,
        exit_time: bar.timestamp,
        quantity: position.quantity,
        pnl,
        exit_reason,
    }
}
