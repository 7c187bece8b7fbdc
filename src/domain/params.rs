//! Strategy parameters: one immutable configuration per run.
//!
//! A backtest, optimization run, or live cycle receives the configuration
//! by reference and never mutates it; parameter evolution produces a new
//! value via [`StrategyParameters::with_value`], keeping past runs
//! reproducible.

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    // Momentum
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,

    // Volatility bands
    pub bb_period: usize,
    pub bb_std: f64,

    // Trend
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,

    // Volume
    pub volume_ma_period: usize,
    pub volume_threshold: f64,

    // Stochastic
    pub stoch_period: usize,
    pub stoch_smooth: usize,

    // Risk
    pub max_position_size: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,

    // Fusion weights
    pub momentum_weight: f64,
    pub mean_reversion_weight: f64,
    pub trend_weight: f64,
    pub volume_weight: f64,
    pub stochastic_weight: f64,

    // Confidence gates
    pub min_signal_confidence: f64,
    pub min_opinion_confidence: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bb_period: 20,
            bb_std: 2.0,
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            volume_ma_period: 20,
            volume_threshold: 1.5,
            stoch_period: 14,
            stoch_smooth: 3,
            max_position_size: 0.1,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            momentum_weight: 0.3,
            mean_reversion_weight: 0.3,
            trend_weight: 0.2,
            volume_weight: 0.2,
            stochastic_weight: 0.15,
            min_signal_confidence: 0.3,
            min_opinion_confidence: 0.2,
        }
    }
}

impl StrategyParameters {
    /// Longest trailing window any indicator needs before it is defined.
    pub fn largest_lookback(&self) -> usize {
        let macd = self.ema_slow + self.macd_signal;
        let stoch = self.stoch_period + self.stoch_smooth;
        [
            self.rsi_period + 1,
            self.bb_period,
            macd,
            self.volume_ma_period,
            stoch,
            11, // 10-period return needs 11 bars
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Bars to skip before the simulator may act.
    pub fn warmup(&self) -> usize {
        self.largest_lookback().max(50)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        fn invalid(reason: &str) -> EngineError {
            EngineError::InvalidParameters {
                reason: reason.to_string(),
            }
        }

        if self.rsi_period == 0 || self.bb_period == 0 || self.volume_ma_period == 0 {
            return Err(invalid("indicator periods must be at least 1"));
        }
        if self.ema_fast == 0 || self.ema_slow == 0 || self.macd_signal == 0 {
            return Err(invalid("EMA and MACD signal periods must be at least 1"));
        }
        if self.stoch_period == 0 || self.stoch_smooth == 0 {
            return Err(invalid("stochastic periods must be at least 1"));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(invalid("ema_fast must be shorter than ema_slow"));
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(invalid("RSI thresholds must satisfy 0 <= oversold < overbought <= 100"));
        }
        if self.bb_std <= 0.0 {
            return Err(invalid("bb_std must be positive"));
        }
        if self.volume_threshold <= 0.0 {
            return Err(invalid("volume_threshold must be positive"));
        }
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(invalid("max_position_size must be in (0, 1]"));
        }
        if self.stop_loss_pct <= 0.0 || self.take_profit_pct <= 0.0 {
            return Err(invalid("stop_loss_pct and take_profit_pct must be positive"));
        }
        let weights = [
            self.momentum_weight,
            self.mean_reversion_weight,
            self.trend_weight,
            self.volume_weight,
            self.stochastic_weight,
        ];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(invalid("fusion weights must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_signal_confidence)
            || !(0.0..=1.0).contains(&self.min_opinion_confidence)
        {
            return Err(invalid("confidence gates must be in [0, 1]"));
        }
        Ok(())
    }

    /// Load from the `[strategy]` section of a config source, falling back
    /// to defaults for absent keys. The result is validated.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = StrategyParameters::default();
        let params = StrategyParameters {
            rsi_period: config.get_int("strategy", "rsi_period", d.rsi_period as i64) as usize,
            rsi_oversold: config.get_double("strategy", "rsi_oversold", d.rsi_oversold),
            rsi_overbought: config.get_double("strategy", "rsi_overbought", d.rsi_overbought),
            bb_period: config.get_int("strategy", "bb_period", d.bb_period as i64) as usize,
            bb_std: config.get_double("strategy", "bb_std", d.bb_std),
            ema_fast: config.get_int("strategy", "ema_fast", d.ema_fast as i64) as usize,
            ema_slow: config.get_int("strategy", "ema_slow", d.ema_slow as i64) as usize,
            macd_signal: config.get_int("strategy", "macd_signal", d.macd_signal as i64) as usize,
            volume_ma_period: config.get_int(
                "strategy",
                "volume_ma_period",
                d.volume_ma_period as i64,
            ) as usize,
            volume_threshold: config.get_double("strategy", "volume_threshold", d.volume_threshold),
            stoch_period: config.get_int("strategy", "stoch_period", d.stoch_period as i64) as usize,
            stoch_smooth: config.get_int("strategy", "stoch_smooth", d.stoch_smooth as i64) as usize,
            max_position_size: config.get_double(
                "strategy",
                "max_position_size",
                d.max_position_size,
            ),
            stop_loss_pct: config.get_double("strategy", "stop_loss_pct", d.stop_loss_pct),
            take_profit_pct: config.get_double("strategy", "take_profit_pct", d.take_profit_pct),
            momentum_weight: config.get_double("strategy", "momentum_weight", d.momentum_weight),
            mean_reversion_weight: config.get_double(
                "strategy",
                "mean_reversion_weight",
                d.mean_reversion_weight,
            ),
            trend_weight: config.get_double("strategy", "trend_weight", d.trend_weight),
            volume_weight: config.get_double("strategy", "volume_weight", d.volume_weight),
            stochastic_weight: config.get_double(
                "strategy",
                "stochastic_weight",
                d.stochastic_weight,
            ),
            min_signal_confidence: config.get_double(
                "strategy",
                "min_signal_confidence",
                d.min_signal_confidence,
            ),
            min_opinion_confidence: config.get_double(
                "strategy",
                "min_opinion_confidence",
                d.min_opinion_confidence,
            ),
        };
        params.validate()?;
        Ok(params)
    }

    /// Produce a new configuration with one named parameter replaced.
    /// Integer-valued parameters are rounded from the candidate value.
    /// The result is not revalidated here; grid search validates per
    /// combination so a bad candidate skips that combination only.
    pub fn with_value(&self, name: &str, value: f64) -> Result<Self, EngineError> {
        let mut next = self.clone();
        match name {
            "rsi_period" => next.rsi_period = value.round() as usize,
            "rsi_oversold" => next.rsi_oversold = value,
            "rsi_overbought" => next.rsi_overbought = value,
            "bb_period" => next.bb_period = value.round() as usize,
            "bb_std" => next.bb_std = value,
            "ema_fast" => next.ema_fast = value.round() as usize,
            "ema_slow" => next.ema_slow = value.round() as usize,
            "macd_signal" => next.macd_signal = value.round() as usize,
            "volume_ma_period" => next.volume_ma_period = value.round() as usize,
            "volume_threshold" => next.volume_threshold = value,
            "stoch_period" => next.stoch_period = value.round() as usize,
            "stoch_smooth" => next.stoch_smooth = value.round() as usize,
            "max_position_size" => next.max_position_size = value,
            "stop_loss_pct" => next.stop_loss_pct = value,
            "take_profit_pct" => next.take_profit_pct = value,
            "momentum_weight" => next.momentum_weight = value,
            "mean_reversion_weight" => next.mean_reversion_weight = value,
            "trend_weight" => next.trend_weight = value,
            "volume_weight" => next.volume_weight = value,
            "stochastic_weight" => next.stochastic_weight = value,
            "min_signal_confidence" => next.min_signal_confidence = value,
            "min_opinion_confidence" => next.min_opinion_confidence = value,
            _ => {
                return Err(EngineError::UnknownParameter {
                    name: name.to_string(),
                })
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn defaults_validate() {
        assert!(StrategyParameters::default().validate().is_ok());
    }

    #[test]
    fn warmup_is_at_least_fifty() {
        let params = StrategyParameters::default();
        assert!(params.warmup() >= 50);
        assert!(params.warmup() >= params.largest_lookback());
    }

    #[test]
    fn largest_lookback_tracks_slow_indicators() {
        let params = StrategyParameters {
            ema_slow: 60,
            macd_signal: 9,
            ..StrategyParameters::default()
        };
        assert_eq!(params.largest_lookback(), 69);
        assert_eq!(params.warmup(), 69);
    }

    #[test]
    fn validate_rejects_inverted_emas() {
        let params = StrategyParameters {
            ema_fast: 26,
            ema_slow: 12,
            ..StrategyParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_period() {
        let params = StrategyParameters {
            rsi_period: 0,
            ..StrategyParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_position() {
        let params = StrategyParameters {
            max_position_size: 1.5,
            ..StrategyParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_weight() {
        let params = StrategyParameters {
            trend_weight: 1.2,
            ..StrategyParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn with_value_returns_new_config() {
        let base = StrategyParameters::default();
        let next = base.with_value("rsi_oversold", 25.0).unwrap();
        assert_eq!(next.rsi_oversold, 25.0);
        assert_eq!(base.rsi_oversold, 30.0);
    }

    #[test]
    fn with_value_rounds_integer_parameters() {
        let next = StrategyParameters::default()
            .with_value("rsi_period", 21.4)
            .unwrap();
        assert_eq!(next.rsi_period, 21);
    }

    #[test]
    fn with_value_unknown_name() {
        let err = StrategyParameters::default()
            .with_value("no_such_knob", 1.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownParameter { .. }));
    }

    #[test]
    fn from_config_overrides_and_defaults() {
        let content = "[strategy]\nrsi_period = 21\nmax_position_size = 0.2\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        let params = StrategyParameters::from_config(&adapter).unwrap();
        assert_eq!(params.rsi_period, 21);
        assert_eq!(params.max_position_size, 0.2);
        assert_eq!(params.bb_period, 20);
    }

    #[test]
    fn from_config_rejects_invalid() {
        let content = "[strategy]\nema_fast = 50\nema_slow = 20\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert!(StrategyParameters::from_config(&adapter).is_err());
    }
}
