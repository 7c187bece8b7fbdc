//! Signal generators: five independent strategies, one shared contract.
//!
//! Each generator is a pure function of (snapshot, price, parameters) and
//! returns a [`SignalOpinion`]. The set is a closed enum so fusion and
//! tests can enumerate every variant.

pub mod momentum;
pub mod mean_reversion;
pub mod trend;
pub mod volume;
pub mod stochastic;
pub mod fusion;

use serde::{Deserialize, Serialize};

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
            Direction::Hold => write!(f, "HOLD"),
        }
    }
}

/// One generator's opinion on the latest bar. Confidence is always within
/// [0, 1]; a Hold carries the reason no direction was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalOpinion {
    pub direction: Direction,
    pub confidence: f64,
    pub rationale: String,
}

impl SignalOpinion {
    pub fn hold(rationale: impl Into<String>) -> Self {
        SignalOpinion {
            direction: Direction::Hold,
            confidence: 0.0,
            rationale: rationale.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    Momentum,
    MeanReversion,
    Trend,
    Volume,
    Stochastic,
}

impl Generator {
    pub const ALL: [Generator; 5] = [
        Generator::Momentum,
        Generator::MeanReversion,
        Generator::Trend,
        Generator::Volume,
        Generator::Stochastic,
    ];

    pub fn evaluate(
        &self,
        snapshot: &IndicatorSnapshot,
        price: f64,
        params: &StrategyParameters,
    ) -> SignalOpinion {
        match self {
            Generator::Momentum => momentum::evaluate(snapshot, price, params),
            Generator::MeanReversion => mean_reversion::evaluate(snapshot, price, params),
            Generator::Trend => trend::evaluate(snapshot, price, params),
            Generator::Volume => volume::evaluate(snapshot, price, params),
            Generator::Stochastic => stochastic::evaluate(snapshot, price, params),
        }
    }

    pub fn weight(&self, params: &StrategyParameters) -> f64 {
        match self {
            Generator::Momentum => params.momentum_weight,
            Generator::MeanReversion => params.mean_reversion_weight,
            Generator::Trend => params.trend_weight,
            Generator::Volume => params.volume_weight,
            Generator::Stochastic => params.stochastic_weight,
        }
    }

    /// Evaluate every generator in declaration order.
    pub fn evaluate_all(
        snapshot: &IndicatorSnapshot,
        price: f64,
        params: &StrategyParameters,
    ) -> Vec<(Generator, SignalOpinion)> {
        Generator::ALL
            .iter()
            .map(|g| (*g, g.evaluate(snapshot, price, params)))
            .collect()
    }
}
