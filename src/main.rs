use anyhow::{Context, Result};
use birria::prelude::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "birria")]
#[command(about = "A Rust-based EMA-crossover backtesting engine for crypto futures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest
    Run {
        //path to csv data file (timestamp,open,high,low,close[,volume])
        #[arg(long)]
        data: PathBuf,

        //symbol under test (eg btcusdt), overrides the configured symbols
        #[arg(long)]
        symbol: Option<String>,

        //path to a bot configuration json file
        //when given, the strategy flags below are ignored
        #[arg(long)]
        config: Option<PathBuf>,

        //short ema period
        #[arg(long, default_value = "9")]
        ema_short: usize,

        //medium ema period
        #[arg(long, default_value = "21")]
        ema_medium: usize,

        //atr lookback period
        #[arg(long, default_value = "14")]
        atr_period: usize,

        //stop loss distance in atr multiples
        #[arg(long, default_value = "2.0")]
        stop_mult: f64,

        //take profit distance in atr multiples
        #[arg(long, default_value = "3.0")]
        target_mult: f64,

        //initial account capital in usd
        #[arg(long, default_value = "10000")]
        initial_capital: f64,

        //usd notional allocated per trade
        #[arg(long, default_value = "1000")]
        trade_amount: f64,

        //output path for the full report as json
        #[arg(long)]
        output_json: Option<PathBuf>,

        //output path for the simulated trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            symbol,
            config,
            ema_short,
            ema_medium,
            atr_period,
            stop_mult,
            target_mult,
            initial_capital,
            trade_amount,
            output_json,
            output_trades_csv,
        } => {
            run(
                data,
                symbol,
                config,
                ema_short,
                ema_medium,
                atr_period,
                stop_mult,
                target_mult,
                initial_capital,
                trade_amount,
                output_json,
                output_trades_csv,
            )?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run(
    data_path: PathBuf,
    symbol: Option<String>,
    config_path: Option<PathBuf>,
    ema_short: usize,
    ema_medium: usize,
    atr_period: usize,
    stop_mult: f64,
    target_mult: f64,
    initial_capital: f64,
    trade_amount: f64,
    output_json: Option<PathBuf>,
    output_trades_csv: Option<PathBuf>,
) -> Result<()> {
    println!("Birria Crypto Futures Backtesting Engine");
    println!("=========================================\n");

    //load data as raw text, the engine owns the parsing
    println!("Loading data from {:?}...", data_path);
    let history_csv = std::fs::read_to_string(&data_path)
        .context(format!("Failed to read data file {:?}", data_path))?;

    //resolve configuration: file wins over flags
    let config = match config_path {
        Some(path) => BotConfig::from_json_file(&path)
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => BotConfig {
            target_symbols: symbol.clone().into_iter().collect(),
            ema_short_period: ema_short,
            ema_medium_period: ema_medium,
            exit: ExitPolicy::AtrExit {
                atr_period,
                stop_loss_multiplier: stop_mult,
                take_profit_multiplier: target_mult,
            },
            trading_enabled: false,
        },
    };

    match config.exit {
        ExitPolicy::AtrExit {
            atr_period,
            stop_loss_multiplier,
            take_profit_multiplier,
        } => println!(
            "Strategy: EMA({}/{}) crossover, ATR({}) exits (SL x{}, TP x{})",
            config.ema_short_period,
            config.ema_medium_period,
            atr_period,
            stop_loss_multiplier,
            take_profit_multiplier
        ),
        ExitPolicy::NoAtrExit => println!(
            "Strategy: EMA({}/{}) crossover, no ATR exit policy",
            config.ema_short_period, config.ema_medium_period
        ),
    }
    println!("Initial capital: ${:.2}", initial_capital);
    println!("Per-trade allocation: ${:.2}\n", trade_amount);

    let request = BacktestRequest {
        initial_capital,
        trade_amount_usd: trade_amount,
        symbol_override: symbol,
        history_csv,
    };

    println!("Running backtest...\n");
    let report = run_backtest(&request, &config);

    if let Some(message) = &report.error_message {
        println!("Backtest failed: {message}");
    } else {
        println!("Backtest Results ({})", report.symbol);
        println!("================\n");
        report.summary.pretty_print_table();
    }

    //save outputs if requested
    if let Some(json_path) = output_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&json_path, json)
            .context(format!("Failed to write report to {:?}", json_path))?;
        println!("\nReport saved to {:?}", json_path);
    }

    if let Some(trades_path) = output_trades_csv {
        save_trades_csv(&report.trades, &trades_path)?;
        println!("Trades saved to {:?}", trades_path);
    }

    Ok(())
}

fn save_trades_csv(trades: &[ClosedTrade], path: &PathBuf) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(
        file,
        "symbol,side,entry_time,entry_price,exit_time,exit_price,quantity,exit_reason,pnl,pnl_percentage"
    )?;

    for trade in trades {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{}",
            trade.symbol,
            trade.side,
            trade.entry_time.to_rfc3339(),
            trade.entry_price,
            trade.exit_time.to_rfc3339(),
            trade.exit_price,
            trade.quantity,
            trade.exit_reason,
            trade.pnl,
            trade.pnl_percentage
        )?;
    }

    Ok(())
}
