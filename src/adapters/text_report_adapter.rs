//! Plain-text backtest report adapter.

use std::fmt::Write as _;
use std::fs;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn render(result: &BacktestResult, symbol: &str, initial_capital: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "backtest report for {symbol}");

        let period = match (result.equity_curve.first(), result.equity_curve.last()) {
            (Some(first), Some(last)) => format!(
                "{} .. {}",
                first.timestamp.format("%Y-%m-%d %H:%M"),
                last.timestamp.format("%Y-%m-%d %H:%M")
            ),
            _ => "n/a".to_string(),
        };
        let _ = writeln!(out, "period: {period}");
        let _ = writeln!(out, "initial capital: {initial_capital:.2}");
        let _ = writeln!(out, "total return: {:.2}%", result.total_return);
        let _ = writeln!(out, "total trades: {}", result.total_trades);
        let _ = writeln!(out, "win rate: {:.1}%", result.win_rate);
        let _ = writeln!(out, "profit factor: {}", format_ratio(result.profit_factor));
        let _ = writeln!(out, "max drawdown: {:.2}%", result.max_drawdown);
        let _ = writeln!(out, "sharpe ratio: {:.2}", result.sharpe_ratio);
        let _ = writeln!(out, "calmar ratio: {:.2}", result.calmar_ratio);

        let m = &result.performance_metrics;
        let _ = writeln!(out, "avg_win: {:.2}", m.avg_win);
        let _ = writeln!(out, "avg_loss: {:.2}", m.avg_loss);
        let _ = writeln!(out, "largest_win: {:.2}", m.largest_win);
        let _ = writeln!(out, "largest_loss: {:.2}", m.largest_loss);
        let _ = writeln!(out, "consecutive_wins: {}", m.consecutive_wins);
        let _ = writeln!(out, "consecutive_losses: {}", m.consecutive_losses);
        let _ = writeln!(out, "recovery_factor: {:.2}", m.recovery_factor);
        let _ = writeln!(out, "expectancy: {:.2}", m.expectancy);
        let _ = writeln!(out, "total_profit: {:.2}", m.total_profit);
        let _ = writeln!(out, "total_loss: {:.2}", m.total_loss);

        if !result.monthly_returns.is_empty() {
            let months: Vec<String> = result
                .monthly_returns
                .iter()
                .map(|r| format!("{r:.2}%"))
                .collect();
            let _ = writeln!(out, "monthly returns: {}", months.join(", "));
        }

        out
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{value:.2}")
    }
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        symbol: &str,
        initial_capital: f64,
        output_path: &str,
    ) -> Result<(), EngineError> {
        fs::write(output_path, Self::render(result, symbol, initial_capital))?;
        Ok(())
    }
}
