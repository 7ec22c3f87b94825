use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

//why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "Stop Loss")]
    StopLoss,
    #[serde(rename = "Take Profit")]
    TakeProfit,
    #[serde(rename = "End of Data")]
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "Stop Loss"),
            ExitReason::TakeProfit => write!(f, "Take Profit"),
            ExitReason::EndOfData => write!(f, "End of Data"),
        }
    }
}

//the single live position the simulator may hold
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub quantity: f64,
    pub entry_reason: String,
}

impl OpenPosition {
    //stop level from the entry price and current volatility
    pub fn stop_price(&self, atr: f64, stop_loss_multiplier: f64) -> f64 {
        match self.side {
            Side::Long => self.entry_price - atr * stop_loss_multiplier,
            Side::Short => self.entry_price + atr * stop_loss_multiplier,
        }
    }

    //target level from the entry price and current volatility
    pub fn target_price(&self, atr: f64, take_profit_multiplier: f64) -> f64 {
        match self.side {
            Side::Long => self.entry_price + atr * take_profit_multiplier,
            Side::Short => self.entry_price - atr * take_profit_multiplier,
        }
    }

    //converts the open position into an immutable closed trade
    pub fn close(
        self,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> ClosedTrade {
        let pnl = match self.side {
            Side::Long => (exit_price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - exit_price) * self.quantity,
        };

        let notional = self.entry_price * self.quantity;
        let pnl_percentage = if notional != 0.0 {
            pnl / notional * 100.0
        } else {
            0.0
        };

        ClosedTrade {
            symbol: self.symbol,
            side: self.side,
            entry_price: self.entry_price,
            entry_time: self.entry_time,
            exit_price,
            exit_time,
            quantity: self.quantity,
            entry_reason: self.entry_reason,
            exit_reason,
            pnl,
            pnl_percentage,
        }
    }
}

//a completed round trip in the trade log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub quantity: f64,
    pub entry_reason: String,
    pub exit_reason: ExitReason,
    pub pnl: f64,
    pub pnl_percentage: f64,
}
