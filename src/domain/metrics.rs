//! Performance statistics derived from a trade ledger and equity curve.
//!
//! Conventions: ratios (expectancy, profit factor) are computed from
//! fractions; `win_rate`, `total_return`, `max_drawdown` and monthly
//! returns are percentages as serialized. Zero-denominator cases return
//! defined sentinels instead of raising: profit factor is +inf when
//! profits exist with no losses and 0.0 with no trades; Sharpe is 0.0 on
//! zero variance; Calmar and recovery factor are 0.0 on zero drawdown.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::position::{EquityPoint, TradeRecord};

const BARS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub consecutive_wins: usize,
    pub consecutive_losses: usize,
    pub recovery_factor: f64,
    pub expectancy: f64,
    pub total_profit: f64,
    pub total_loss: f64,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[TradeRecord], total_return: f64, max_drawdown: f64) -> Self {
        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p < 0.0).collect();

        let total_profit: f64 = wins.iter().sum();
        let total_loss: f64 = losses.iter().sum::<f64>().abs();

        let avg_win = if wins.is_empty() {
            0.0
        } else {
            total_profit / wins.len() as f64
        };
        // Signed: the average losing trade is negative.
        let avg_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f64>() / losses.len() as f64
        };

        let largest_win = wins.iter().copied().fold(0.0f64, f64::max);
        let largest_loss = losses.iter().copied().fold(0.0f64, f64::min).abs();

        let recovery_factor = if max_drawdown > 0.0 {
            total_return / max_drawdown
        } else {
            0.0
        };

        let win_fraction = if trades.is_empty() {
            0.0
        } else {
            wins.len() as f64 / trades.len() as f64
        };
        let expectancy = win_fraction * avg_win + (1.0 - win_fraction) * avg_loss;

        PerformanceMetrics {
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            consecutive_wins: longest_streak(trades, true),
            consecutive_losses: longest_streak(trades, false),
            recovery_factor,
            expectancy,
            total_profit,
            total_loss,
        }
    }
}

/// Longest run of same-sign trades; breakeven trades break both streaks.
fn longest_streak(trades: &[TradeRecord], wins: bool) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for trade in trades {
        let matches = if wins { trade.pnl > 0.0 } else { trade.pnl < 0.0 };
        if matches {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Percentage of winning trades.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.pnl > 0.0).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross profit over gross loss. +inf when profits exist with no losses,
/// 0.0 when there are no profits either; callers branch on
/// `is_infinite()` rather than dividing blind.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).sum();
    let gross_loss: f64 = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|&p| p < 0.0)
        .sum::<f64>()
        .abs();

    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline of the equity curve, in percent.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd * 100.0
}

/// Annualized mean-over-stdev of per-bar equity returns; 0.0 when the
/// return series is empty or has zero variance.
pub fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter_map(|w| {
            if w[0].equity > 0.0 {
                Some((w[1].equity - w[0].equity) / w[0].equity)
            } else {
                None
            }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stdev = variance.sqrt();

    if stdev > 0.0 {
        mean / stdev * BARS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Total-return over max-drawdown, both taken as fractions; 0.0 on zero
/// drawdown.
pub fn calmar_ratio(total_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown > 0.0 {
        (total_return / 100.0) / (max_drawdown / 100.0)
    } else {
        0.0
    }
}

/// Percent change of equity sampled at month boundaries.
pub fn monthly_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut month_ends: Vec<f64> = Vec::new();
    let mut current_month: Option<(i32, u32)> = None;

    for point in equity_curve {
        let key = (point.timestamp.year(), point.timestamp.month());
        match current_month {
            Some(month) if month == key => {
                if let Some(last) = month_ends.last_mut() {
                    *last = point.equity;
                }
            }
            _ => {
                current_month = Some(key);
                month_ends.push(point.equity);
            }
        }
    }

    month_ends
        .windows(2)
        .filter_map(|w| {
            if w[0] != 0.0 {
                Some((w[1] - w[0]) / w[0] * 100.0)
            } else {
                None
            }
        })
        .collect()
}
