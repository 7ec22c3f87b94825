//a Rust-based EMA-crossover backtesting engine for crypto futures

pub mod config;
pub mod data;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod portfolio;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BotConfig, ConfigError, ExitPolicy, StrategyParameters};
    pub use crate::data::{load_csv, parse_csv_str, Bar, DataError};
    pub use crate::engine::{
        run_backtest, BacktestError, BacktestReport, BacktestRequest, SimulationOutcome,
        TradeSimulator,
    };
    pub use crate::indicators::{atr, ema, IndicatorSeries};
    pub use crate::metrics::{PerformanceSummary, ProfitFactor};
    pub use crate::portfolio::{ClosedTrade, ExitReason, OpenPosition, Side};
}
