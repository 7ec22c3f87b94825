pub mod strategy_config;

pub use strategy_config::{BotConfig, ConfigError, ExitPolicy, StrategyParameters};
