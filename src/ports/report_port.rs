//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        symbol: &str,
        initial_capital: f64,
        output_path: &str,
    ) -> Result<(), EngineError>;
}
