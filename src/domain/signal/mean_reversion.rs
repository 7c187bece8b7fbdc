//! Mean-reversion generator: band-edge proximity plus width expansion.
//!
//! Band position is recomputed against the live price rather than the bar
//! close, so the live path reacts to the quote it would actually trade at.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, SignalOpinion};

const LOWER_EDGE: f64 = 0.1;
const UPPER_EDGE: f64 = 0.9;
const WIDTH_EXPANSION: f64 = 0.1;

pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    price: f64,
    params: &StrategyParameters,
) -> SignalOpinion {
    let (Some(upper), Some(lower)) = (snapshot.bb_upper, snapshot.bb_lower) else {
        return SignalOpinion::hold("mean reversion: bands warming up");
    };
    if upper <= lower {
        return SignalOpinion::hold("mean reversion: degenerate band");
    }

    let position = (price - lower) / (upper - lower);
    let mut confidence = 0.0;
    let mut parts: Vec<String> = Vec::new();

    let near_lower = position < LOWER_EDGE;
    let near_upper = position > UPPER_EDGE;
    if near_lower {
        confidence += 0.6;
        parts.push("price near lower band".into());
    } else if near_upper {
        confidence += 0.6;
        parts.push("price near upper band".into());
    }

    if let Some(width) = snapshot.bb_width {
        if width > WIDTH_EXPANSION {
            confidence += 0.2;
            parts.push("band expansion".into());
        }
    }

    let direction = if confidence > params.min_opinion_confidence {
        if near_lower {
            Direction::Buy
        } else if near_upper {
            Direction::Sell
        } else {
            Direction::Hold
        }
    } else {
        Direction::Hold
    };

    SignalOpinion {
        direction,
        confidence: confidence.min(1.0),
        rationale: format!("mean reversion: {}", parts.join(", ")),
    }
}
