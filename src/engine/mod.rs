pub mod backtest;
pub mod simulator;

pub use backtest::{run_backtest, BacktestError, BacktestReport, BacktestRequest};
pub use simulator::{SimulationOutcome, TradeSimulator};
