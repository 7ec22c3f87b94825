//end-to-end scenarios through the public backtest api

use birria::prelude::*;

const BASE_TS: u64 = 1_700_000_000_000;

//builds a csv blob from (open, high, low, close) rows, one bar per minute
fn csv_from_rows(rows: &[(f64, f64, f64, f64)]) -> String {
    let mut csv = String::from("timestamp,open,high,low,close\n");
    for (i, (open, high, low, close)) in rows.iter().enumerate() {
        let ts = BASE_TS + i as u64 * 60_000;
        csv.push_str(&format!("{ts},{open},{high},{low},{close}\n"));
    }
    csv
}

fn config(stop_mult: f64, target_mult: f64) -> BotConfig {
    BotConfig {
        target_symbols: vec!["BTCUSDT".to_string()],
        ema_short_period: 2,
        ema_medium_period: 4,
        exit: ExitPolicy::AtrExit {
            atr_period: 2,
            stop_loss_multiplier: stop_mult,
            take_profit_multiplier: target_mult,
        },
        trading_enabled: false,
    }
}

fn request(csv: String) -> BacktestRequest {
    BacktestRequest {
        initial_capital: 10_000.0,
        trade_amount_usd: 1_000.0,
        symbol_override: None,
        history_csv: csv,
    }
}

//five flat bars at 100, a jump to 110, then a steady climb to 116
//the short ema crosses above the medium ema exactly once, at the jump
fn uptrend_rows() -> Vec<(f64, f64, f64, f64)> {
    let mut rows = vec![(100.0, 100.0, 100.0, 100.0); 5];
    for close in [110.0, 111.0, 112.0, 113.0, 114.0, 115.0, 116.0] {
        rows.push((close, close, close, close));
    }
    rows
}

#[test]
fn uptrend_crossover_opens_one_trade_closed_at_end_of_data() {
    //multipliers so large that neither stop nor target can ever trigger
    let report = run_backtest(&request(csv_from_rows(&uptrend_rows())), &config(1000.0, 1000.0));

    assert!(!report.is_error(), "{:?}", report.error_message);
    assert_eq!(report.trades.len(), 1);

    let trade = &report.trades[0];
    assert_eq!(trade.side, Side::Long);
    //entry on the crossover bar's close
    assert_eq!(trade.entry_price, 110.0);
    assert_eq!(
        trade.entry_time.timestamp_millis() as u64,
        BASE_TS + 5 * 60_000
    );
    //forced closeout at the final bar's close
    assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    assert_eq!(trade.exit_price, 116.0);
    assert!(trade.pnl > 0.0);

    assert_eq!(report.summary.total_trades, 1);
    assert_eq!(report.summary.winning_trades, 1);
    assert_eq!(report.summary.win_rate, 100.0);
    assert_eq!(report.summary.profit_factor, ProfitFactor::Infinite);
}

#[test]
fn final_capital_equals_initial_plus_trade_pnl() {
    let report = run_backtest(&request(csv_from_rows(&uptrend_rows())), &config(1000.0, 1000.0));

    assert!(!report.is_error());
    let pnl_sum: f64 = report.trades.iter().map(|t| t.pnl).sum();
    //summary values are rounded to cents at the reporting boundary
    assert!((report.summary.final_capital - (10_000.0 + pnl_sum)).abs() < 0.01);
}

#[test]
fn stop_loss_fires_before_end_of_data() {
    //flat bars with a 2-point range, an entry jump to 110, then a plunge
    //through the stop, then a quiet tail with no further crossovers
    let mut rows = vec![(100.0, 101.0, 99.0, 100.0); 5];
    rows.push((110.0, 111.0, 109.0, 110.0)); //crossover entry at 110
    rows.push((104.0, 105.0, 97.0, 104.0)); //low breaches the stop
    rows.push((104.0, 105.0, 103.0, 104.0));
    rows.push((104.0, 105.0, 103.0, 104.0));
    rows.push((104.0, 105.0, 103.0, 104.0));

    let report = run_backtest(&request(csv_from_rows(&rows)), &config(1.0, 1000.0));

    assert!(!report.is_error(), "{:?}", report.error_message);
    assert_eq!(report.trades.len(), 1);

    let trade = &report.trades[0];
    assert_eq!(trade.entry_price, 110.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert!(trade.exit_reason.to_string().contains("Stop Loss"));
    //atr(2) walk: 2.0 warm, (2+11)/2 = 6.5 on the entry bar,
    //(6.5+13)/2 = 9.75 on the exit bar, so the stop sits at 100.25
    assert!((trade.exit_price - 100.25).abs() < 1e-9);
    assert!(trade.pnl < 0.0);

    assert_eq!(report.summary.losing_trades, 1);
    assert!(report.summary.final_capital < 10_000.0);
}

#[test]
fn insufficient_data_produces_error_report_with_zeroed_stats() {
    //10 rows against a 55-period medium ema
    let rows = vec![(100.0, 101.0, 99.0, 100.0); 10];
    let config = BotConfig {
        ema_medium_period: 55,
        ..config(2.0, 3.0)
    };

    let report = run_backtest(&request(csv_from_rows(&rows)), &config);

    assert!(report.is_error());
    assert!(report
        .error_message
        .as_deref()
        .unwrap()
        .contains("Insufficient data"));
    assert_eq!(report.summary.total_trades, 0);
    assert_eq!(report.summary.net_profit, 0.0);
    assert_eq!(report.summary.final_capital, 0.0);
    assert!(report.trades.is_empty());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let req = request(csv_from_rows(&uptrend_rows()));
    let cfg = config(1000.0, 1000.0);

    let first = serde_json::to_string(&run_backtest(&req, &cfg)).unwrap();
    let second = serde_json::to_string(&run_backtest(&req, &cfg)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn report_json_round_trips() {
    let report = run_backtest(&request(csv_from_rows(&uptrend_rows())), &config(1000.0, 1000.0));

    let json = serde_json::to_string(&report).unwrap();
    let back: BacktestReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert_eq!(back.summary.profit_factor, ProfitFactor::Infinite);
}
