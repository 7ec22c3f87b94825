use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Strategy parameter '{0}' must be positive")]
    NonPositiveParameter(&'static str),
    #[error("EMA periods must differ: short {short} >= medium {medium}")]
    EmaPeriodOrder { short: usize, medium: usize },
    #[error("Configuration has no ATR exit policy, backtesting requires one")]
    NoAtrExit,
    #[error("No target symbol: pass an override or configure target_symbols")]
    NoSymbol,
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

//exit handling for the strategy
//the atr period and the two multipliers travel together so a half-configured
//exit policy cannot be expressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitPolicy {
    NoAtrExit,
    AtrExit {
        atr_period: usize,
        stop_loss_multiplier: f64,
        take_profit_multiplier: f64,
    },
}

//bot configuration as stored by the external configuration service
//closed record: unknown fields are rejected at parse time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    pub target_symbols: Vec<String>,
    pub ema_short_period: usize,
    pub ema_medium_period: usize,
    pub exit: ExitPolicy,
    pub trading_enabled: bool,
}

impl BotConfig {
    //load configuration from a json file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    //save configuration to a json file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //resolves the configuration into validated simulator parameters
    pub fn strategy_parameters(&self) -> Result<StrategyParameters, ConfigError> {
        let (atr_period, stop_loss_multiplier, take_profit_multiplier) = match self.exit {
            ExitPolicy::AtrExit {
                atr_period,
                stop_loss_multiplier,
                take_profit_multiplier,
            } => (atr_period, stop_loss_multiplier, take_profit_multiplier),
            ExitPolicy::NoAtrExit => return Err(ConfigError::NoAtrExit),
        };

        let params = StrategyParameters {
            ema_short_period: self.ema_short_period,
            ema_medium_period: self.ema_medium_period,
            atr_period,
            stop_loss_multiplier,
            take_profit_multiplier,
        };
        params.validate()?;
        Ok(params)
    }

    //resolves the symbol to test: explicit override wins, else the first
    //configured target symbol
    pub fn resolve_symbol(&self, symbol_override: Option<&str>) -> Result<String, ConfigError> {
        if let Some(symbol) = symbol_override {
            if !symbol.is_empty() {
                return Ok(symbol.to_string());
            }
        }

        self.target_symbols
            .first()
            .filter(|s| !s.is_empty())
            .cloned()
            .ok_or(ConfigError::NoSymbol)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            target_symbols: vec!["BTCUSDT".to_string()],
            ema_short_period: 9,
            ema_medium_period: 21,
            exit: ExitPolicy::AtrExit {
                atr_period: 14,
                stop_loss_multiplier: 2.0,
                take_profit_multiplier: 3.0,
            },
            trading_enabled: false,
        }
    }
}

//immutable parameter set for one backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub ema_short_period: usize,
    pub ema_medium_period: usize,
    pub atr_period: usize,
    pub stop_loss_multiplier: f64,
    pub take_profit_multiplier: f64,
}

impl StrategyParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ema_short_period == 0 {
            return Err(ConfigError::NonPositiveParameter("ema_short_period"));
        }
        if self.ema_medium_period == 0 {
            return Err(ConfigError::NonPositiveParameter("ema_medium_period"));
        }
        if self.atr_period == 0 {
            return Err(ConfigError::NonPositiveParameter("atr_period"));
        }
        if !(self.stop_loss_multiplier > 0.0) {
            return Err(ConfigError::NonPositiveParameter("stop_loss_multiplier"));
        }
        if !(self.take_profit_multiplier > 0.0) {
            return Err(ConfigError::NonPositiveParameter("take_profit_multiplier"));
        }
        if self.ema_short_period >= self.ema_medium_period {
            return Err(ConfigError::EmaPeriodOrder {
                short: self.ema_short_period,
                medium: self.ema_medium_period,
            });
        }
        Ok(())
    }

    //bars needed before a run makes sense: the longest warm-up plus a
    //safety margin of bars left over for simulation
    pub fn min_required_bars(&self) -> usize {
        self.ema_short_period
            .max(self.ema_medium_period)
            .max(self.atr_period)
            + 5
    }
}
