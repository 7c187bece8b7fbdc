//! Stochastic generator: %K/%D extremes with a Williams %R read.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, SignalOpinion};

const OVERSOLD: f64 = 20.0;
const OVERBOUGHT: f64 = 80.0;
const BUY_ZONE: f64 = 30.0;
const WILLIAMS_OVERSOLD: f64 = -80.0;
const WILLIAMS_OVERBOUGHT: f64 = -20.0;

pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    _price: f64,
    params: &StrategyParameters,
) -> SignalOpinion {
    let (Some(k), Some(d)) = (snapshot.stoch_k, snapshot.stoch_d) else {
        return SignalOpinion::hold("stochastic: oscillator warming up");
    };

    let mut confidence = 0.0;
    let mut parts: Vec<String> = Vec::new();

    if k < OVERSOLD && d < OVERSOLD {
        confidence += 0.3;
        parts.push("stochastic oversold".into());
    } else if k > OVERBOUGHT && d > OVERBOUGHT {
        confidence += 0.3;
        parts.push("stochastic overbought".into());
    }

    if let Some(wr) = snapshot.williams_r {
        if wr < WILLIAMS_OVERSOLD {
            confidence += 0.2;
            parts.push("Williams %R oversold".into());
        } else if wr > WILLIAMS_OVERBOUGHT {
            confidence += 0.2;
            parts.push("Williams %R overbought".into());
        }
    }

    let direction = if confidence > params.min_opinion_confidence {
        if k < BUY_ZONE {
            Direction::Buy
        } else {
            Direction::Sell
        }
    } else {
        Direction::Hold
    };

    SignalOpinion {
        direction,
        confidence: confidence.min(1.0),
        rationale: format!("stochastic: {}", parts.join(", ")),
    }
}
