use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

//represents a single ohlc(v) bar of market data
//high >= low is assumed for range math, garbage-in is otherwise tolerated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    //accepted in the input, unused by the engine
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //creates a bar from a unix-millisecond timestamp
    //returns none if the millisecond value is outside chrono's representable range
    pub fn from_millis(
        timestamp_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Option<Self> {
        let timestamp = Utc.timestamp_millis_opt(timestamp_ms).single()?;
        Some(Bar::new(timestamp, open, high, low, close, volume))
    }

    //returns the bar range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
