use crate::config::{BotConfig, ConfigError, StrategyParameters};
use crate::data::{parse_csv_str, DataError};
use crate::engine::simulator::TradeSimulator;
use crate::indicators::IndicatorSeries;
use crate::metrics::PerformanceSummary;
use crate::portfolio::ClosedTrade;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//anything that can stop a run before simulation begins
//all variants are recovered at the orchestrator boundary
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("Per-trade allocation must be positive, got {0}")]
    NonPositiveAllocation(f64),
}

//raw request for one backtest run
#[derive(Debug, Clone)]
pub struct BacktestRequest {
    pub initial_capital: f64,
    pub trade_amount_usd: f64,
    pub symbol_override: Option<String>,
    //already-materialized historical data, comma-delimited with a header row
    pub history_csv: String,
}

//the uniform result shape handed to callers
//failures populate error_message and zero the statistics, they never throw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub parameters: Option<StrategyParameters>,
    pub summary: PerformanceSummary,
    pub trades: Vec<ClosedTrade>,
    pub error_message: Option<String>,
}

impl BacktestReport {
    //error-carrying report with zeroed statistics
    pub fn failed(symbol: String, initial_capital: f64, message: String) -> Self {
        BacktestReport {
            symbol,
            parameters: None,
            summary: PerformanceSummary::zeroed(initial_capital),
            trades: Vec::new(),
            error_message: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

//validates the request, wires loader, indicators, simulator and aggregator
//together and shapes the outcome into the uniform report
pub fn run_backtest(request: &BacktestRequest, config: &BotConfig) -> BacktestReport {
    match try_run(request, config) {
        Ok(report) => report,
        Err(err) => {
            //best-effort symbol for the error payload
            let symbol = config
                .resolve_symbol(request.symbol_override.as_deref())
                .unwrap_or_default();
            BacktestReport::failed(symbol, request.initial_capital, err.to_string())
        }
    }
}

fn try_run(request: &BacktestRequest, config: &BotConfig) -> Result<BacktestReport, BacktestError> {
    if !(request.initial_capital > 0.0) {
        return Err(BacktestError::NonPositiveCapital(request.initial_capital));
    }
    if !(request.trade_amount_usd > 0.0) {
        return Err(BacktestError::NonPositiveAllocation(request.trade_amount_usd));
    }

    let params = config.strategy_parameters()?;
    let symbol = config.resolve_symbol(request.symbol_override.as_deref())?;

    let bars = parse_csv_str(&request.history_csv)?;

    let need = params.min_required_bars();
    if bars.len() < need {
        return Err(DataError::InsufficientData {
            have: bars.len(),
            need,
        }
        .into());
    }

    info!("backtesting {} over {} bars", symbol, bars.len());

    let indicators = IndicatorSeries::compute(&bars, &params);
    let outcome = TradeSimulator::new(
        &symbol,
        &params,
        request.initial_capital,
        request.trade_amount_usd,
    )
    .run(&bars, &indicators);

    info!(
        "{}: {} trades, final capital {:.2}",
        symbol,
        outcome.trades.len(),
        outcome.final_capital
    );

    let summary = PerformanceSummary::from_trades(
        &outcome.trades,
        request.initial_capital,
        outcome.final_capital,
    );

    Ok(BacktestReport {
        symbol,
        parameters: Some(params),
        summary,
        trades: outcome.trades,
        error_message: None,
    })
}
