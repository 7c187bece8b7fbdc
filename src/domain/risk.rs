//! Multi-factor risk assessment for proposed trades.
//!
//! Five dimensions are scored independently (trade size, portfolio
//! exposure, correlation, concentration, drawdown/streak) and combined
//! into a 0-100 score with a level and a position-size ceiling. The
//! assessor owns rolling single-writer state: a capped daily P&L window,
//! a capped position-history window and a correlation matrix. Reporting
//! surfaces read [`RiskAssessor::summary`] snapshots, never the live
//! buffers. Degenerate inputs fail safe to Critical with a zero ceiling.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::signal::Direction;

const DAILY_PNL_WINDOW: usize = 30;
const POSITION_WINDOW: usize = 100;
const DRAWDOWN_SAMPLES: usize = 5;

/// Fraction of entry price assumed at risk per trade (stop distance).
const ASSUMED_STOP_DISTANCE: f64 = 0.02;
const HIGH_CORRELATION: f64 = 0.7;
const MAX_SINGLE_SYMBOL_SHARE: f64 = 0.2;
const MAX_PORTFOLIO_CONCENTRATION: f64 = 0.3;

// Fixed penalty per out-of-limit dimension.
const TRADE_PENALTY: f64 = 30.0;
const PORTFOLIO_PENALTY: f64 = 25.0;
const CORRELATION_PENALTY: f64 = 20.0;
const CONCENTRATION_PENALTY: f64 = 15.0;
const DRAWDOWN_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub position_adjustments: HashMap<String, f64>,
    pub max_new_position_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position_size: f64,
    pub max_risk_per_trade: f64,
    pub max_daily_loss: f64,
    pub max_consecutive_losses: usize,
    pub max_correlation_exposure: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            max_position_size: 0.1,
            max_risk_per_trade: 0.02,
            max_daily_loss: 0.05,
            max_consecutive_losses: 5,
            max_correlation_exposure: 0.7,
        }
    }
}

/// Read-only snapshot for monitoring; always a copy of the live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_exposure: f64,
    pub max_drawdown: f64,
    pub concentration: f64,
    pub position_count: usize,
    pub daily_pnl_count: usize,
    pub limits: RiskLimits,
}

#[derive(Debug, Clone)]
struct PositionRecord {
    symbol: String,
    size: f64,
    price: f64,
}

#[derive(Debug, Clone, Copy)]
struct RiskCheck {
    within_limits: bool,
    magnitude: f64,
}

#[derive(Debug, Clone, Copy)]
struct PortfolioMetrics {
    total_exposure: f64,
    /// Tracked notional over portfolio value.
    exposure_ratio: f64,
    /// Trailing peak-to-trough loss of cumulative daily P&L, as a fraction
    /// of portfolio value.
    drawdown: f64,
    /// Largest single position's share of tracked notional.
    concentration: f64,
}

#[derive(Debug)]
pub struct RiskAssessor {
    limits: RiskLimits,
    daily_pnl: VecDeque<f64>,
    positions: VecDeque<PositionRecord>,
    correlations: HashMap<String, HashMap<String, f64>>,
}

impl RiskAssessor {
    pub fn new(limits: RiskLimits) -> Self {
        RiskAssessor {
            limits,
            daily_pnl: VecDeque::new(),
            positions: VecDeque::new(),
            correlations: HashMap::new(),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Record one realized P&L sample; the window is capped.
    pub fn record_daily_pnl(&mut self, pnl: f64) {
        self.daily_pnl.push_back(pnl);
        while self.daily_pnl.len() > DAILY_PNL_WINDOW {
            self.daily_pnl.pop_front();
        }
    }

    /// Record an entered position for exposure tracking; the window is capped.
    pub fn record_position(&mut self, symbol: &str, size: f64, price: f64) {
        self.positions.push_back(PositionRecord {
            symbol: symbol.to_string(),
            size,
            price,
        });
        while self.positions.len() > POSITION_WINDOW {
            self.positions.pop_front();
        }
    }

    pub fn set_correlations(&mut self, symbol: &str, correlations: HashMap<String, f64>) {
        self.correlations.insert(symbol.to_string(), correlations);
    }

    /// Score a proposed trade. `proposed_size` is a quantity; notional is
    /// `proposed_size * price`.
    pub fn assess_trade(
        &self,
        symbol: &str,
        direction: Direction,
        proposed_size: f64,
        price: f64,
        portfolio_value: f64,
    ) -> RiskAssessment {
        if !(portfolio_value.is_finite() && portfolio_value > 0.0)
            || !proposed_size.is_finite()
            || proposed_size < 0.0
            || !(price.is_finite() && price > 0.0)
        {
            warn!(
                component = "risk",
                symbol,
                %direction,
                "degenerate risk input, failing safe to critical"
            );
            return Self::failsafe("invalid portfolio state for risk assessment");
        }

        let metrics = self.portfolio_metrics(portfolio_value);

        let trade = self.check_trade(proposed_size, price, portfolio_value);
        let portfolio = self.check_portfolio(&metrics);
        let correlation = self.check_correlation(symbol);
        let concentration = self.check_concentration(symbol, proposed_size, price, portfolio_value);
        let (drawdown, consecutive_losses) = self.check_drawdown(portfolio_value);

        let mut score = 0.0;
        if !trade.within_limits {
            score += TRADE_PENALTY;
        }
        if !portfolio.within_limits {
            score += PORTFOLIO_PENALTY;
        }
        if !correlation.within_limits {
            score += CORRELATION_PENALTY;
        }
        if !concentration.within_limits {
            score += CONCENTRATION_PENALTY;
        }
        if !drawdown.within_limits {
            score += DRAWDOWN_PENALTY;
        }
        score += trade.magnitude * 100.0;
        score += portfolio.magnitude * 50.0;
        score += correlation.magnitude * 100.0;
        score += concentration.magnitude * 100.0;
        score += drawdown.magnitude * 100.0;
        let risk_score = score.clamp(0.0, 100.0);

        let risk_level = if risk_score >= 80.0 {
            RiskLevel::Critical
        } else if risk_score >= 60.0 {
            RiskLevel::High
        } else if risk_score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let (warnings, recommendations) = Self::guidance(
            risk_level,
            &trade,
            &portfolio,
            &correlation,
            &concentration,
            &drawdown,
            consecutive_losses,
        );

        let position_adjustments = Self::position_adjustments(risk_level, proposed_size, &metrics);
        let max_new_position_size = self.position_ceiling(risk_level, &metrics);

        RiskAssessment {
            risk_level,
            risk_score,
            warnings,
            recommendations,
            position_adjustments,
            max_new_position_size,
        }
    }

    /// Snapshot of the rolling state for monitoring surfaces.
    pub fn summary(&self, portfolio_value: f64) -> RiskSummary {
        let pv = if portfolio_value > 0.0 {
            portfolio_value
        } else {
            1.0
        };
        let metrics = self.portfolio_metrics(pv);
        RiskSummary {
            total_exposure: metrics.total_exposure,
            max_drawdown: metrics.drawdown,
            concentration: metrics.concentration,
            position_count: self.positions.len(),
            daily_pnl_count: self.daily_pnl.len(),
            limits: self.limits.clone(),
        }
    }

    fn portfolio_metrics(&self, portfolio_value: f64) -> PortfolioMetrics {
        let total_exposure: f64 = self.positions.iter().map(|p| p.size * p.price).sum();

        let mut drawdown = 0.0f64;
        let mut cumulative = 0.0;
        let mut peak = 0.0f64;
        for pnl in &self.daily_pnl {
            cumulative += pnl;
            peak = peak.max(cumulative);
            drawdown = drawdown.max(peak - cumulative);
        }

        let concentration = if total_exposure > 0.0 {
            let largest = self
                .positions
                .iter()
                .map(|p| p.size * p.price)
                .fold(0.0f64, f64::max);
            largest / total_exposure
        } else {
            0.0
        };

        PortfolioMetrics {
            total_exposure,
            exposure_ratio: total_exposure / portfolio_value,
            drawdown: drawdown / portfolio_value,
            concentration,
        }
    }

    fn check_trade(&self, proposed_size: f64, price: f64, portfolio_value: f64) -> RiskCheck {
        let position_pct = proposed_size * price / portfolio_value;
        let risk_per_trade = position_pct * ASSUMED_STOP_DISTANCE;
        RiskCheck {
            within_limits: position_pct <= self.limits.max_position_size
                && risk_per_trade <= self.limits.max_risk_per_trade,
            magnitude: risk_per_trade,
        }
    }

    fn check_portfolio(&self, metrics: &PortfolioMetrics) -> RiskCheck {
        RiskCheck {
            within_limits: metrics.exposure_ratio <= 1.0
                && metrics.drawdown <= self.limits.max_daily_loss
                && metrics.concentration <= MAX_PORTFOLIO_CONCENTRATION,
            magnitude: metrics.exposure_ratio,
        }
    }

    fn check_correlation(&self, symbol: &str) -> RiskCheck {
        let count = self
            .correlations
            .get(symbol)
            .map(|row| {
                row.values()
                    .filter(|rho| rho.abs() > HIGH_CORRELATION)
                    .count()
            })
            .unwrap_or(0);
        let magnitude = (count as f64 * 0.1).min(0.5);
        RiskCheck {
            within_limits: magnitude <= self.limits.max_correlation_exposure,
            magnitude,
        }
    }

    fn check_concentration(
        &self,
        symbol: &str,
        proposed_size: f64,
        price: f64,
        portfolio_value: f64,
    ) -> RiskCheck {
        let current: f64 = self
            .positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .map(|p| p.size * p.price)
            .sum();
        let combined = (current + proposed_size * price) / portfolio_value;
        let magnitude = combined.min(1.0);
        RiskCheck {
            within_limits: magnitude <= MAX_SINGLE_SYMBOL_SHARE,
            magnitude,
        }
    }

    fn check_drawdown(&self, portfolio_value: f64) -> (RiskCheck, usize) {
        if self.daily_pnl.len() < DRAWDOWN_SAMPLES {
            return (
                RiskCheck {
                    within_limits: true,
                    magnitude: 0.0,
                },
                0,
            );
        }

        let recent: Vec<f64> = self
            .daily_pnl
            .iter()
            .rev()
            .take(DRAWDOWN_SAMPLES)
            .rev()
            .copied()
            .collect();

        let mut cumulative = 0.0;
        let mut high = f64::NEG_INFINITY;
        let mut low = f64::INFINITY;
        for pnl in &recent {
            cumulative += pnl;
            high = high.max(cumulative);
            low = low.min(cumulative);
        }
        let magnitude = (high - low).max(0.0) / portfolio_value;

        let consecutive_losses = recent.iter().rev().take_while(|&&pnl| pnl < 0.0).count();

        (
            RiskCheck {
                within_limits: magnitude <= self.limits.max_daily_loss
                    && consecutive_losses < self.limits.max_consecutive_losses,
                magnitude,
            },
            consecutive_losses,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn guidance(
        level: RiskLevel,
        trade: &RiskCheck,
        portfolio: &RiskCheck,
        correlation: &RiskCheck,
        concentration: &RiskCheck,
        drawdown: &RiskCheck,
        consecutive_losses: usize,
    ) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        match level {
            RiskLevel::Critical => {
                warnings.push("critical risk: trade should be avoided".into());
                recommendations.push("reduce position size or avoid trade entirely".into());
            }
            RiskLevel::High => {
                warnings.push("high risk detected".into());
                recommendations.push("consider reducing position size".into());
            }
            _ => {}
        }

        if !trade.within_limits {
            warnings.push("position size exceeds individual trade limits".into());
            recommendations.push("reduce position size to within risk limits".into());
        }
        if !portfolio.within_limits {
            warnings.push("portfolio risk limits exceeded".into());
            recommendations.push("reduce overall portfolio exposure".into());
        }
        if !correlation.within_limits {
            warnings.push("high correlation risk detected".into());
            recommendations.push("diversify across uncorrelated assets".into());
        }
        if !concentration.within_limits {
            warnings.push("concentration risk too high".into());
            recommendations.push("reduce position size in this asset".into());
        }
        if !drawdown.within_limits {
            warnings.push(format!(
                "drawdown risk detected ({consecutive_losses} consecutive losses)"
            ));
            recommendations.push("reduce risk or pause trading".into());
        }

        (warnings, recommendations)
    }

    fn position_adjustments(
        level: RiskLevel,
        proposed_size: f64,
        metrics: &PortfolioMetrics,
    ) -> HashMap<String, f64> {
        let mut adjusted = match level {
            RiskLevel::Critical => 0.0,
            RiskLevel::High => proposed_size * 0.5,
            RiskLevel::Medium => proposed_size * 0.75,
            RiskLevel::Low => proposed_size,
        };
        if metrics.drawdown > 0.05 {
            adjusted *= 0.5;
        }
        if metrics.concentration > 0.2 {
            adjusted *= 0.7;
        }

        let mut adjustments = HashMap::new();
        adjustments.insert("max_position_size".to_string(), adjusted);
        adjustments
    }

    fn position_ceiling(&self, level: RiskLevel, metrics: &PortfolioMetrics) -> f64 {
        let multiplier = match level {
            RiskLevel::Critical => 0.0,
            RiskLevel::High => 0.3,
            RiskLevel::Medium => 0.6,
            RiskLevel::Low => 0.8,
        };
        let mut ceiling = self.limits.max_position_size * multiplier;
        if metrics.drawdown > 0.03 || metrics.concentration > 0.15 {
            ceiling *= 0.5;
        }
        ceiling
    }

    fn failsafe(reason: &str) -> RiskAssessment {
        let mut adjustments = HashMap::new();
        adjustments.insert("max_position_size".to_string(), 0.0);
        RiskAssessment {
            risk_level: RiskLevel::Critical,
            risk_score: 100.0,
            warnings: vec![reason.to_string()],
            recommendations: vec![
                "avoid trade".to_string(),
                "review risk parameters".to_string(),
            ],
            position_adjustments: adjustments,
            max_new_position_size: 0.0,
        }
    }
}
