//! Momentum generator: RSI extremes, MACD crossover, short-horizon return.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, SignalOpinion};

const MOMENTUM_BREAK: f64 = 0.02;

pub fn evaluate(
    snapshot: &IndicatorSnapshot,
    _price: f64,
    params: &StrategyParameters,
) -> SignalOpinion {
    let Some(rsi) = snapshot.rsi else {
        return SignalOpinion::hold("momentum: indicators warming up");
    };

    let mut confidence = 0.0;
    let mut parts: Vec<String> = Vec::new();

    let oversold = rsi < params.rsi_oversold;
    if oversold {
        confidence += 0.3;
        parts.push(format!("RSI oversold ({rsi:.1})"));
    } else if rsi > params.rsi_overbought {
        confidence += 0.3;
        parts.push(format!("RSI overbought ({rsi:.1})"));
    }

    let mut macd_bullish = false;
    if let (Some(macd), Some(signal), Some(hist)) =
        (snapshot.macd, snapshot.macd_signal, snapshot.macd_histogram)
    {
        if macd > signal && hist > 0.0 {
            confidence += 0.4;
            macd_bullish = true;
            parts.push("MACD bullish crossover".into());
        } else if macd < signal && hist < 0.0 {
            confidence += 0.4;
            parts.push("MACD bearish crossover".into());
        }
    }

    if let Some(m5) = snapshot.momentum_5 {
        if m5 > MOMENTUM_BREAK {
            confidence += 0.3;
            parts.push("strong 5-period momentum".into());
        } else if m5 < -MOMENTUM_BREAK {
            confidence += 0.3;
            parts.push("strong 5-period negative momentum".into());
        }
    }

    let direction = if confidence > params.min_opinion_confidence {
        if oversold || macd_bullish {
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
        rationale: format!("momentum: {}", parts.join(", ")),
    }
}
