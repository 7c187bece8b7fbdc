//! Signal fusion: weighted combination of generator opinions into one
//! trading decision.
//!
//! Two asymmetries are intentional: the volume boost goes to whichever
//! side is currently leading with ties going to the sell side, and the
//! final direction requires the winning score to strictly clear the gate.
//! Changing either silently changes every historical result.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::params::StrategyParameters;
use crate::domain::signal::{Direction, Generator, SignalOpinion};

/// A fused, actionable decision. Flat and serializable for logging and
/// persistence downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub position_size: f64,
    pub rationale: String,
    pub timestamp: NaiveDateTime,
}

/// Combine generator opinions. Returns `None` when the decision is Hold.
pub fn fuse(
    opinions: &[(Generator, SignalOpinion)],
    symbol: &str,
    price: f64,
    timestamp: NaiveDateTime,
    params: &StrategyParameters,
) -> Option<TradingSignal> {
    let mut buy_score = 0.0;
    let mut sell_score = 0.0;

    for (generator, opinion) in opinions {
        if *generator == Generator::Volume {
            continue;
        }
        let weighted = opinion.confidence * generator.weight(params);
        match opinion.direction {
            Direction::Buy => buy_score += weighted,
            Direction::Sell => sell_score += weighted,
            Direction::Hold => {}
        }
    }

    if let Some((generator, opinion)) = opinions.iter().find(|(g, _)| *g == Generator::Volume) {
        let boost = opinion.confidence * generator.weight(params);
        if buy_score > sell_score {
            buy_score += boost;
        } else {
            sell_score += boost;
        }
    }

    let (direction, confidence) = if buy_score > sell_score && buy_score > params.min_signal_confidence
    {
        (Direction::Buy, buy_score)
    } else if sell_score > buy_score && sell_score > params.min_signal_confidence {
        (Direction::Sell, sell_score)
    } else {
        return None;
    };

    let position_size = (confidence * params.max_position_size).min(params.max_position_size);

    let (stop_loss, take_profit) = match direction {
        Direction::Buy => (
            price * (1.0 - params.stop_loss_pct),
            price * (1.0 + params.take_profit_pct),
        ),
        Direction::Sell => (
            price * (1.0 + params.stop_loss_pct),
            price * (1.0 - params.take_profit_pct),
        ),
        Direction::Hold => unreachable!(),
    };

    let rationale = opinions
        .iter()
        .filter(|(_, o)| o.confidence > 0.0 || o.direction != Direction::Hold)
        .map(|(_, o)| o.rationale.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    Some(TradingSignal {
        symbol: symbol.to_string(),
        direction,
        confidence,
        entry_price: price,
        stop_loss: Some(stop_loss),
        take_profit: Some(take_profit),
        position_size,
        rationale,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn opinion(direction: Direction, confidence: f64) -> SignalOpinion {
        SignalOpinion {
            direction,
            confidence,
            rationale: format!("test {direction}"),
        }
    }

    fn params() -> StrategyParameters {
        StrategyParameters {
            momentum_weight: 0.3,
            mean_reversion_weight: 0.3,
            trend_weight: 0.2,
            volume_weight: 0.2,
            stochastic_weight: 0.0,
            min_signal_confidence: 0.3,
            ..StrategyParameters::default()
        }
    }

    #[test]
    fn all_hold_is_no_signal() {
        let opinions: Vec<_> = Generator::ALL
            .iter()
            .map(|g| (*g, SignalOpinion::hold("nothing")))
            .collect();
        assert!(fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).is_none());
    }

    #[test]
    fn weighted_buy_wins() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::MeanReversion, SignalOpinion::hold("")),
            (Generator::Trend, opinion(Direction::Buy, 0.8)),
            (Generator::Volume, opinion(Direction::Hold, 0.0)),
            (Generator::Stochastic, SignalOpinion::hold("")),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        assert_eq!(signal.direction, Direction::Buy);
        assert!((signal.confidence - 0.46).abs() < 1e-12);
        assert!((signal.position_size - 0.046).abs() < 1e-12);
    }

    #[test]
    fn below_gate_is_no_signal() {
        let opinions = vec![
            (Generator::Trend, opinion(Direction::Buy, 0.8)),
            (Generator::Volume, opinion(Direction::Hold, 0.0)),
        ];
        // 0.8 * 0.2 = 0.16 < 0.3
        assert!(fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).is_none());
    }

    #[test]
    fn volume_boosts_leading_side() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::Volume, opinion(Direction::Hold, 1.0)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        // buy 0.3 leads, volume adds 0.2
        assert!((signal.confidence - 0.5).abs() < 1e-12);
        assert_eq!(signal.direction, Direction::Buy);
    }

    #[test]
    fn volume_tie_break_favors_sell() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::MeanReversion, opinion(Direction::Sell, 1.0)),
            (Generator::Volume, opinion(Direction::Hold, 1.0)),
        ];
        // buy = sell = 0.3 before the boost; the tie sends volume to sell.
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        assert_eq!(signal.direction, Direction::Sell);
        assert!((signal.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn buy_levels_bracket_entry() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::Trend, opinion(Direction::Buy, 1.0)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        let p = params();
        assert_eq!(signal.stop_loss, Some(100.0 * (1.0 - p.stop_loss_pct)));
        assert_eq!(signal.take_profit, Some(100.0 * (1.0 + p.take_profit_pct)));
    }

    #[test]
    fn sell_levels_are_mirrored() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Sell, 1.0)),
            (Generator::Trend, opinion(Direction::Sell, 1.0)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        let p = params();
        assert_eq!(signal.stop_loss, Some(100.0 * (1.0 + p.stop_loss_pct)));
        assert_eq!(signal.take_profit, Some(100.0 * (1.0 - p.take_profit_pct)));
    }

    #[test]
    fn position_size_caps_at_max() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::MeanReversion, opinion(Direction::Buy, 1.0)),
            (Generator::Trend, opinion(Direction::Buy, 1.0)),
            (Generator::Volume, opinion(Direction::Hold, 1.0)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        assert!(signal.confidence > 1.0 - 1e-12);
        assert!(signal.position_size <= params().max_position_size);
    }

    #[test]
    fn rationale_joins_contributors() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::MeanReversion, SignalOpinion::hold("warming up")),
            (Generator::Trend, opinion(Direction::Buy, 0.8)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        assert!(signal.rationale.contains(" | "));
        assert!(!signal.rationale.contains("warming up"));
    }

    #[test]
    fn signal_round_trips_through_json() {
        let opinions = vec![
            (Generator::Momentum, opinion(Direction::Buy, 1.0)),
            (Generator::Trend, opinion(Direction::Buy, 1.0)),
        ];
        let signal = fuse(&opinions, "BTCUSDT", 100.0, ts(), &params()).unwrap();
        let json = serde_json::to_string(&signal).unwrap();
        let back: TradingSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(signal, back);
    }
}
