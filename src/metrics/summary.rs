use crate::portfolio::ClosedTrade;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//rounds a reported value to cents
//internal accumulation stays full precision, only the summary rounds
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//gross profit / gross loss, with the degenerate cases made explicit
//serialized as a number, the string "Infinity", or null when undefined
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Ratio(f64),
    Infinite,
    Undefined,
}

impl ProfitFactor {
    fn compute(gross_profit: f64, gross_loss: f64) -> Self {
        if gross_loss > 0.0 {
            ProfitFactor::Ratio(gross_profit / gross_loss)
        } else if gross_profit > 0.0 {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Undefined
        }
    }
}

impl Serialize for ProfitFactor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Ratio(v) => serializer.serialize_f64(*v),
            ProfitFactor::Infinite => serializer.serialize_str("Infinity"),
            ProfitFactor::Undefined => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(ProfitFactor::Undefined),
            Some(serde_json::Value::String(s)) if s == "Infinity" => Ok(ProfitFactor::Infinite),
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .map(ProfitFactor::Ratio)
                .ok_or_else(|| serde::de::Error::custom("profit factor out of range")),
            Some(other) => Err(serde::de::Error::custom(format!(
                "unexpected profit factor value: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Ratio(v) => write!(f, "{v:.3}"),
            ProfitFactor::Infinite => write!(f, "Infinity"),
            ProfitFactor::Undefined => write!(f, "n/a"),
        }
    }
}

//summary statistics over the closed-trade log and the capital trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub net_profit: f64,
    pub net_profit_percentage: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub average_win_amount: f64,
    pub average_loss_amount: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: ProfitFactor,
    pub max_drawdown: f64,
    pub pnl_std_dev: f64,
}

impl PerformanceSummary {
    //a summary with every statistic zeroed, used for error reports
    pub fn zeroed(initial_capital: f64) -> Self {
        PerformanceSummary {
            initial_capital,
            final_capital: 0.0,
            net_profit: 0.0,
            net_profit_percentage: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            average_win_amount: 0.0,
            average_loss_amount: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: ProfitFactor::Undefined,
            max_drawdown: 0.0,
            pnl_std_dev: 0.0,
        }
    }

    //reduces the trade log plus capital trajectory into summary statistics
    pub fn from_trades(trades: &[ClosedTrade], initial_capital: f64, final_capital: f64) -> Self {
        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p < 0.0).collect();

        let total_trades = trades.len();
        let winning_trades = wins.len();
        let losing_trades = losses.len();

        //a zero-pnl trade counts as neither a win nor a loss
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();

        let average_win_amount = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };
        let average_loss_amount = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        let largest_win = wins.iter().fold(0.0f64, |a, &b| a.max(b));
        let largest_loss = losses.iter().fold(0.0f64, |a, &b| a.min(b));

        let net_profit = final_capital - initial_capital;
        let net_profit_percentage = if initial_capital != 0.0 {
            net_profit / initial_capital * 100.0
        } else {
            0.0
        };

        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let pnl_std_dev = if pnls.len() >= 2 {
            pnls.std_dev()
        } else {
            0.0
        };

        PerformanceSummary {
            initial_capital: round2(initial_capital),
            final_capital: round2(final_capital),
            net_profit: round2(net_profit),
            net_profit_percentage: round2(net_profit_percentage),
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: round2(win_rate),
            average_win_amount: round2(average_win_amount),
            average_loss_amount: round2(average_loss_amount),
            largest_win: round2(largest_win),
            largest_loss: round2(largest_loss),
            profit_factor: ProfitFactor::compute(gross_profit, gross_loss),
            max_drawdown: round2(max_drawdown(trades, initial_capital) * 100.0),
            pnl_std_dev: round2(pnl_std_dev),
        }
    }

    //prints the summary as a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
        table.add_row(Row::new(vec![
            Cell::new("Initial Capital"),
            Cell::new(&format!("${:.2}", self.initial_capital)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Final Capital"),
            Cell::new(&format!("${:.2}", self.final_capital)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Net Profit"),
            Cell::new(&format!(
                "${:.2} ({:.2}%)",
                self.net_profit, self.net_profit_percentage
            )),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Total Trades"),
            Cell::new(&format!("{}", self.total_trades)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Winning / Losing"),
            Cell::new(&format!("{} / {}", self.winning_trades, self.losing_trades)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Win Rate"),
            Cell::new(&format!("{:.2}%", self.win_rate)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Avg Win"),
            Cell::new(&format!("${:.2}", self.average_win_amount)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Avg Loss"),
            Cell::new(&format!("${:.2}", self.average_loss_amount)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Largest Win"),
            Cell::new(&format!("${:.2}", self.largest_win)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Largest Loss"),
            Cell::new(&format!("${:.2}", self.largest_loss)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Profit Factor"),
            Cell::new(&self.profit_factor.to_string()),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Max Drawdown"),
            Cell::new(&format!("{:.2}%", self.max_drawdown)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("PnL Std Dev"),
            Cell::new(&format!("${:.2}", self.pnl_std_dev)),
        ]));

        table.printstd();
    }
}

//peak-to-trough drawdown over the per-trade-close capital trajectory
fn max_drawdown(trades: &[ClosedTrade], initial_capital: f64) -> f64 {
    let mut capital = initial_capital;
    let mut peak = initial_capital;
    let mut max_dd = 0.0f64;

    for trade in trades {
        capital += trade.pnl;
        if capital > peak {
            peak = capital;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - capital) / peak);
        }
    }

    max_dd
}
