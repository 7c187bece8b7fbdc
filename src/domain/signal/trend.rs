//! Trend generator: EMA ordering plus price position against both EMAs.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, SignalOpinion};

pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    price: f64,
    params: &StrategyParameters,
) -> SignalOpinion {
    let (Some(fast), Some(slow)) = (snapshot.ema_fast, snapshot.ema_slow) else {
        return SignalOpinion::hold("trend: EMAs warming up");
    };

    let mut confidence = 0.0;
    let mut parts: Vec<String> = Vec::new();

    let uptrend = fast > slow;
    if uptrend {
        confidence += 0.5;
        parts.push("fast EMA above slow (uptrend)".into());
    } else {
        confidence += 0.5;
        parts.push("fast EMA below slow (downtrend)".into());
    }

    if price > fast && fast > slow {
        confidence += 0.3;
        parts.push("price above both EMAs".into());
    } else if price < fast && fast < slow {
        confidence += 0.3;
        parts.push("price below both EMAs".into());
    }

    let direction = if confidence > params.min_opinion_confidence {
        if uptrend && price > fast {
            Direction::Buy
        } else if !uptrend && price < fast {
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
        rationale: format!("trend: {}", parts.join(", ")),
    }
}
