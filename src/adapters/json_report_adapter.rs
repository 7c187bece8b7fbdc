//! JSON backtest report adapter: persists the full result for downstream
//! tooling, field names as serialized by the domain types.

use std::fs;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        _symbol: &str,
        _initial_capital: f64,
        output_path: &str,
    ) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(result)?;
        fs::write(output_path, json)?;
        Ok(())
    }
}
