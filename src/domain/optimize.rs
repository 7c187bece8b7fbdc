//! Parameter optimization: exhaustive grid search over candidate values.
//!
//! Every combination is a pure, independent simulator run, so the grid is
//! evaluated in parallel; results are re-ranked afterwards so the output
//! is deterministic regardless of scheduling. A failing combination is
//! logged and skipped rather than aborting the sweep.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::params::StrategyParameters;

/// Ordered parameter-name -> candidate-values map. Iteration order is the
/// insertion order, which fixes the combination enumeration order.
#[derive(Debug, Clone, Default)]
pub struct ParameterGrid {
    entries: Vec<(String, Vec<f64>)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        ParameterGrid::default()
    }

    pub fn add(mut self, name: &str, values: Vec<f64>) -> Self {
        self.entries.push((name.to_string(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of combinations in the full cross-product.
    pub fn combination_count(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).product()
    }

    /// Enumerate the full cross-product as (name, value) assignments.
    fn combinations(&self) -> Vec<Vec<(String, f64)>> {
        let mut combos: Vec<Vec<(String, f64)>> = vec![Vec::new()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for &value in values {
                    let mut extended = combo.clone();
                    extended.push((name.clone(), value));
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// One scored combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub parameters: Vec<(String, f64)>,
    pub score: f64,
    pub total_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

/// Full sweep outcome: the ranked list (best first) plus the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best: OptimizationRecord,
    pub results: Vec<OptimizationRecord>,
}

/// Composite score: Sharpe x win rate x (1 - drawdown fraction).
fn score(result: &BacktestResult) -> f64 {
    result.sharpe_ratio * result.win_rate * (1.0 - result.max_drawdown / 100.0)
}

pub fn optimize(
    symbol: &str,
    bars: &[Bar],
    base: &StrategyParameters,
    grid: &ParameterGrid,
    initial_capital: f64,
) -> Result<OptimizationResult, EngineError> {
    let combos = grid.combinations();
    info!(
        component = "optimizer",
        symbol,
        combinations = combos.len(),
        "starting grid search"
    );

    let mut results: Vec<OptimizationRecord> = combos
        .par_iter()
        .filter_map(|combo| {
            let mut params = base.clone();
            for (name, value) in combo {
                params = match params.with_value(name, *value) {
                    Ok(next) => next,
                    Err(err) => {
                        warn!(
                            component = "optimizer",
                            combination = ?combo,
                            %err,
                            "skipping combination"
                        );
                        return None;
                    }
                };
            }

            match run_backtest(symbol, bars, &params, initial_capital) {
                Ok(result) => Some(OptimizationRecord {
                    parameters: combo.clone(),
                    score: score(&result),
                    total_return: result.total_return,
                    win_rate: result.win_rate,
                    max_drawdown: result.max_drawdown,
                    sharpe_ratio: result.sharpe_ratio,
                }),
                Err(err) => {
                    warn!(
                        component = "optimizer",
                        combination = ?combo,
                        %err,
                        "skipping combination"
                    );
                    None
                }
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let best = results
        .first()
        .cloned()
        .ok_or_else(|| EngineError::Data {
            reason: format!("all {} parameter combinations failed", combos.len()),
        })?;

    info!(
        component = "optimizer",
        symbol,
        best_score = best.score,
        evaluated = results.len(),
        "grid search finished"
    );

    Ok(OptimizationResult { best, results })
}
