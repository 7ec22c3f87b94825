use crate::config::StrategyParameters;
use crate::data::Bar;
use crate::indicators::IndicatorSeries;
use crate::portfolio::{ClosedTrade, ExitReason, OpenPosition, Side};
use chrono::{DateTime, Utc};
use log::debug;

//what a finished simulation hands to the aggregator
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub trades: Vec<ClosedTrade>,
    pub final_capital: f64,
}

//bar-by-bar state machine holding at most one open position
//walks the series in a single forward pass, no look-ahead
pub struct TradeSimulator<'a> {
    symbol: &'a str,
    params: &'a StrategyParameters,
    trade_amount_usd: f64,
    capital: f64,
    position: Option<OpenPosition>,
    trades: Vec<ClosedTrade>,
}

impl<'a> TradeSimulator<'a> {
    pub fn new(
        symbol: &'a str,
        params: &'a StrategyParameters,
        initial_capital: f64,
        trade_amount_usd: f64,
    ) -> Self {
        TradeSimulator {
            symbol,
            params,
            trade_amount_usd,
            capital: initial_capital,
            position: None,
            trades: Vec::new(),
        }
    }

    //runs the simulation over the bar series and its aligned indicators
    pub fn run(mut self, bars: &[Bar], indicators: &IndicatorSeries) -> SimulationOutcome {
        let start = indicators.first_defined_index().unwrap_or(bars.len());

        for i in start..bars.len() {
            if !indicators.all_defined(i) {
                continue;
            }

            let bar = &bars[i];
            //atr is known to be defined here
            let atr = indicators.atr[i].unwrap_or(0.0);

            //exits are evaluated before entries, so a position opened on this
            //bar is never closed by the same bar
            self.check_exit(bar, atr);
            self.check_entry(bars, indicators, i);
        }

        //force-close whatever is still open at the last bar's close
        if let (Some(position), Some(last)) = (self.position.take(), bars.last()) {
            self.record_close(position, last.close, last.timestamp, ExitReason::EndOfData);
        }

        SimulationOutcome {
            trades: self.trades,
            final_capital: self.capital,
        }
    }

    //applies the stop/target policy to an open position
    //the stop is checked before the target: when one bar's range spans both
    //levels the trade exits at the stop
    fn check_exit(&mut self, bar: &Bar, atr: f64) {
        let Some(position) = self.position.take() else {
            return;
        };

        let stop = position.stop_price(atr, self.params.stop_loss_multiplier);
        let target = position.target_price(atr, self.params.take_profit_multiplier);

        let exit = match position.side {
            Side::Long => {
                if bar.low <= stop {
                    Some((stop, ExitReason::StopLoss))
                } else if bar.high >= target {
                    Some((target, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
            Side::Short => {
                if bar.high >= stop {
                    Some((stop, ExitReason::StopLoss))
                } else if bar.low <= target {
                    Some((target, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
        };

        match exit {
            Some((price, reason)) => self.record_close(position, price, bar.timestamp, reason),
            None => self.position = Some(position),
        }
    }

    //opens a position on an ema crossover when flat and funded
    fn check_entry(&mut self, bars: &[Bar], indicators: &IndicatorSeries, i: usize) {
        if self.position.is_some() || self.capital <= self.trade_amount_usd {
            return;
        }

        if i == 0 {
            return;
        }

        //the crossover needs the previous bar's ema values as well
        let (Some(prev_short), Some(prev_medium)) =
            (indicators.ema_short[i - 1], indicators.ema_medium[i - 1])
        else {
            return;
        };
        let (Some(short), Some(medium)) = (indicators.ema_short[i], indicators.ema_medium[i])
        else {
            return;
        };

        let side = if prev_short <= prev_medium && short > medium {
            Side::Long
        } else if prev_short >= prev_medium && short < medium {
            Side::Short
        } else {
            return;
        };

        let bar = &bars[i];
        if bar.close <= 0.0 {
            return;
        }

        //fixed-notional sizing: a constant usd allocation per trade
        let quantity = self.trade_amount_usd / bar.close;

        debug!(
            "entry {} {} @ {} qty {:.8}",
            self.symbol, side, bar.close, quantity
        );

        self.position = Some(OpenPosition {
            symbol: self.symbol.to_string(),
            side,
            entry_price: bar.close,
            entry_time: bar.timestamp,
            quantity,
            entry_reason: format!("EMA crossover ({})", side.to_string().to_lowercase()),
        });
    }

    //folds a close into the capital trajectory and the trade log
    fn record_close(
        &mut self,
        position: OpenPosition,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        reason: ExitReason,
    ) {
        let trade = position.close(exit_price, exit_time, reason);
        debug!(
            "exit {} {} @ {} ({}) pnl {:.2}",
            trade.symbol, trade.side, trade.exit_price, trade.exit_reason, trade.pnl
        );
        self.capital += trade.pnl;
        self.trades.push(trade);
    }
}
