//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvBarAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::synthetic_adapter::generate_bars;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::bar::Bar;
use crate::domain::error::EngineError;
use crate::domain::indicator::annotate;
use crate::domain::optimize::{optimize, ParameterGrid};
use crate::domain::params::StrategyParameters;
use crate::domain::signal::fusion::fuse;
use crate::domain::signal::Generator;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_BASE_PRICE: f64 = 100.0;

#[derive(Parser, Debug)]
#[command(name = "confluence", about = "Multi-strategy signal-fusion trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over CSV bars, or a seeded synthetic series
    Backtest {
        /// Strategy configuration (INI); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory of {symbol}_{timeframe}.csv bar files
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        /// Number of bars to replay
        #[arg(long, default_value_t = 500)]
        bars: usize,
        /// Seed for the synthetic series (ignored with --data)
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000.0)]
        capital: f64,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grid-search parameters listed in the config's [optimize] section
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        #[arg(long, default_value_t = 500)]
        bars: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000.0)]
        capital: f64,
    },
    /// Print the latest fused trading signal as JSON
    Signal {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        #[arg(long, default_value_t = 500)]
        bars: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            timeframe,
            bars,
            seed,
            capital,
            output,
        } => run_backtest_command(
            config.as_ref(),
            data,
            &symbol,
            &timeframe,
            bars,
            seed,
            capital,
            output.as_ref(),
        ),
        Command::Optimize {
            config,
            data,
            symbol,
            timeframe,
            bars,
            seed,
            capital,
        } => run_optimize_command(&config, data, &symbol, &timeframe, bars, seed, capital),
        Command::Signal {
            config,
            data,
            symbol,
            timeframe,
            bars,
            seed,
        } => run_signal_command(config.as_ref(), data, &symbol, &timeframe, bars, seed),
        Command::Validate { config } => run_validate_command(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_params(config_path: Option<&PathBuf>) -> Result<StrategyParameters, EngineError> {
    match config_path {
        Some(path) => {
            let adapter = load_config(path)?;
            StrategyParameters::from_config(&adapter)
        }
        None => Ok(StrategyParameters::default()),
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, EngineError> {
    FileConfigAdapter::from_file(path).map_err(|e| EngineError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_bars(
    data: Option<PathBuf>,
    symbol: &str,
    timeframe: &str,
    count: usize,
    seed: u64,
    capital: f64,
) -> Result<Vec<Bar>, EngineError> {
    match data {
        Some(dir) => {
            eprintln!("Loading bars from {}", dir.display());
            CsvBarAdapter::new(dir, capital).get_bars(symbol, timeframe, count)
        }
        None => {
            eprintln!("Generating {count} synthetic bars (seed {seed})");
            Ok(generate_bars(seed, count, DEFAULT_BASE_PRICE))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_command(
    config: Option<&PathBuf>,
    data: Option<PathBuf>,
    symbol: &str,
    timeframe: &str,
    bars: usize,
    seed: u64,
    capital: f64,
    output: Option<&PathBuf>,
) -> Result<(), EngineError> {
    let params = load_params(config)?;
    let series = load_bars(data, symbol, timeframe, bars, seed, capital)?;

    let result = run_backtest(symbol, &series, &params, capital)?;
    print!("{}", TextReportAdapter::render(&result, symbol, capital));

    if let Some(path) = output {
        JsonReportAdapter.write(&result, symbol, capital, &path.display().to_string())?;
        eprintln!("Result written to {}", path.display());
    }
    Ok(())
}

fn run_optimize_command(
    config: &PathBuf,
    data: Option<PathBuf>,
    symbol: &str,
    timeframe: &str,
    bars: usize,
    seed: u64,
    capital: f64,
) -> Result<(), EngineError> {
    let adapter = load_config(config)?;
    let params = StrategyParameters::from_config(&adapter)?;
    let grid = build_grid(&adapter)?;
    if grid.is_empty() {
        return Err(EngineError::ConfigMissing {
            section: "optimize".into(),
            key: "<any parameter>".into(),
        });
    }

    let series = load_bars(data, symbol, timeframe, bars, seed, capital)?;
    eprintln!("Evaluating {} combinations...", grid.combination_count());
    let outcome = optimize(symbol, &series, &params, &grid, capital)?;

    println!("best combination (score {:.4}):", outcome.best.score);
    for (name, value) in &outcome.best.parameters {
        println!("  {name} = {value}");
    }
    println!(
        "  total return: {:.2}%  win rate: {:.1}%  max drawdown: {:.2}%  sharpe: {:.2}",
        outcome.best.total_return,
        outcome.best.win_rate,
        outcome.best.max_drawdown,
        outcome.best.sharpe_ratio,
    );
    println!("evaluated {} combinations", outcome.results.len());
    Ok(())
}

/// Build the grid from the `[optimize]` section: each key names a strategy
/// parameter, each value is a comma-separated candidate list.
fn build_grid(adapter: &FileConfigAdapter) -> Result<ParameterGrid, EngineError> {
    let mut grid = ParameterGrid::new();
    for (key, value) in adapter.section("optimize") {
        let mut candidates = Vec::new();
        for token in value.split(',') {
            let parsed: f64 = token.trim().parse().map_err(|_| EngineError::ConfigInvalid {
                section: "optimize".into(),
                key: key.clone(),
                reason: format!("'{}' is not a number", token.trim()),
            })?;
            candidates.push(parsed);
        }
        if candidates.is_empty() {
            return Err(EngineError::ConfigInvalid {
                section: "optimize".into(),
                key: key.clone(),
                reason: "empty candidate list".into(),
            });
        }
        grid = grid.add(&key, candidates);
    }
    Ok(grid)
}

fn run_signal_command(
    config: Option<&PathBuf>,
    data: Option<PathBuf>,
    symbol: &str,
    timeframe: &str,
    bars: usize,
    seed: u64,
) -> Result<(), EngineError> {
    let params = load_params(config)?;
    let series = load_bars(data, symbol, timeframe, bars, seed, 0.0)?;

    if series.len() <= params.warmup() {
        return Err(EngineError::InsufficientData {
            symbol: symbol.to_string(),
            bars: series.len(),
            minimum: params.warmup() + 1,
        });
    }

    let snapshots = annotate(&series, &params);
    let last = &series[series.len() - 1];
    let snapshot = &snapshots[snapshots.len() - 1];
    let opinions = Generator::evaluate_all(snapshot, last.close, &params);

    match fuse(&opinions, symbol, last.close, last.timestamp, &params) {
        Some(signal) => println!("{}", serde_json::to_string_pretty(&signal)?),
        None => println!("no signal for {symbol}: holding"),
    }
    Ok(())
}

fn run_validate_command(config: &PathBuf) -> Result<(), EngineError> {
    let adapter = load_config(config)?;
    let params = StrategyParameters::from_config(&adapter)?;
    println!("configuration OK");
    println!("  warm-up: {} bars", params.warmup());
    println!(
        "  weights: momentum {} / mean reversion {} / trend {} / volume {} / stochastic {}",
        params.momentum_weight,
        params.mean_reversion_weight,
        params.trend_weight,
        params.volume_weight,
        params.stochastic_weight,
    );
    println!(
        "  gates: signal {} / opinion {}",
        params.min_signal_confidence, params.min_opinion_confidence
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn build_grid_parses_candidate_lists() {
        let file = config_file("[optimize]\nrsi_oversold = 25, 30, 35\nstop_loss_pct = 0.01,0.02\n");
        let adapter = load_config(&file.path().to_path_buf()).unwrap();
        let grid = build_grid(&adapter).unwrap();
        assert_eq!(grid.combination_count(), 6);
    }

    #[test]
    fn build_grid_rejects_non_numeric() {
        let file = config_file("[optimize]\nrsi_oversold = abc\n");
        let adapter = load_config(&file.path().to_path_buf()).unwrap();
        assert!(build_grid(&adapter).is_err());
    }

    #[test]
    fn load_params_defaults_without_config() {
        let params = load_params(None).unwrap();
        assert_eq!(params, StrategyParameters::default());
    }

    #[test]
    fn load_params_reads_overrides() {
        let file = config_file("[strategy]\nrsi_period = 21\n");
        let params = load_params(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(params.rsi_period, 21);
    }

    #[test]
    fn missing_config_file_is_a_parse_error() {
        let err = load_config(&PathBuf::from("/nonexistent/config.ini")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse { .. }));
    }
}
