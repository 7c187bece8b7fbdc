//! Volume generator: confirmation only, never directional.
//!
//! Fusion adds this generator's weighted confidence to whichever side is
//! already leading, so the opinion always reports Hold.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, SignalOpinion};

const SURGE_RATIO: f64 = 2.0;

pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    _price: f64,
    params: &StrategyParameters,
) -> SignalOpinion {
    let Some(ratio) = snapshot.volume_ratio else {
        return SignalOpinion::hold("volume: ratio warming up");
    };

    let mut confidence: f64 = 0.0;
    let mut parts: Vec<String> = Vec::new();

    if ratio > params.volume_threshold {
        confidence += 0.4;
        parts.push(format!("high volume ({ratio:.1}x average)"));
    }
    if ratio > SURGE_RATIO {
        confidence += 0.3;
        parts.push("very high volume".into());
    }

    SignalOpinion {
        direction: Direction::Hold,
        confidence: confidence.min(1.0),
        rationale: format!("volume: {}", parts.join(", ")),
    }
}
