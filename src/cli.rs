//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_state_adapter::{CsvPositionStore, CsvTradeHistory};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_adapter::ConsoleLogAdapter;
use crate::adapters::paper_broker_adapter::PaperBrokerAdapter;
use crate::adapters::static_auth_adapter::StaticAuthAdapter;
use crate::domain::error::TickwheelError;
use crate::domain::ledger::PositionLedger;
use crate::domain::order::TradeType;
use crate::domain::session::SessionCoordinator;
use crate::domain::strategy::{Sizing, StrategyRegistry, Tracker};
use crate::ports::config_port::ConfigPort;
use crate::ports::log_port::LogSink;

#[derive(Parser, Debug)]
#[command(name = "tickwheel", about = "Tick-driven equities trading controller")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay one symbol and strategy over historical candles
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "Intraday")]
        trade_type: String,
        #[arg(long, default_value = "Quantity")]
        sizing_type: String,
        #[arg(long, default_value_t = 1.0)]
        sizing_value: f64,
    },
    /// Replay configured trackers with wall-clock pacing
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// List registered strategies
    ListStrategies,
    /// Show persisted open positions
    Positions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the persisted trade history
    History {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            start,
            end,
            trade_type,
            sizing_type,
            sizing_value,
        } => run_backtest(
            &config,
            &symbol,
            &strategy,
            &start,
            &end,
            &trade_type,
            &sizing_type,
            sizing_value,
        ),
        Command::Simulate {
            config,
            start,
            end,
            speed,
        } => run_simulate(&config, &start, &end, speed),
        Command::ListStrategies => run_list_strategies(),
        Command::Positions { config } => run_positions(&config),
        Command::History { config } => run_history(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TickwheelError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate, ExitCode> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        eprintln!("error: invalid --{name} '{value}' (expected YYYY-MM-DD)");
        ExitCode::from(2)
    })
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, TickwheelError> {
    config
        .get_string(section, key)
        .ok_or_else(|| TickwheelError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

/// Wire up a coordinator against the CSV adapters named in the config.
fn build_coordinator(config: &dyn ConfigPort) -> Result<SessionCoordinator, TickwheelError> {
    let token = require_string(config, "auth", "access_token")?;
    let candles_dir = require_string(config, "data", "candles_dir")?;
    let state_dir = config
        .get_string("state", "dir")
        .unwrap_or_else(|| "state".to_string());
    fs::create_dir_all(&state_dir)?;

    let log: Arc<dyn LogSink> = Arc::new(ConsoleLogAdapter);
    let state_path = PathBuf::from(state_dir);
    let ledger = Arc::new(
        PositionLedger::new(
            Box::new(CsvPositionStore::new(state_path.join("positions.csv"))),
            Box::new(CsvTradeHistory::new(state_path.join("trade_history.csv"))),
            Arc::clone(&log),
        )?
        .with_broker(Box::new(PaperBrokerAdapter::new(Arc::clone(&log)))),
    );

    Ok(SessionCoordinator::new(
        Box::new(StaticAuthAdapter::new(token)),
        Box::new(CsvDataAdapter::new(PathBuf::from(candles_dir))),
        ledger,
        StrategyRegistry::builtin(),
        log,
    ))
}

/// Trackers from `[tracker:<SYMBOL>]` sections. Malformed trackers are
/// warned about and skipped so one bad section cannot take down a run.
pub fn load_trackers(config: &dyn ConfigPort) -> Vec<Tracker> {
    let mut trackers = Vec::new();
    for section in config.sections() {
        let Some(symbol) = section.strip_prefix("tracker:") else {
            continue;
        };
        let symbol = symbol.to_uppercase();

        let Some(strategy_name) = config.get_string(&section, "strategy") else {
            eprintln!("warning: [{section}] has no strategy key; skipped");
            continue;
        };

        let trade_type_str = config
            .get_string(&section, "trade_type")
            .unwrap_or_else(|| "Intraday".to_string());
        let Some(trade_type) = TradeType::parse(&trade_type_str) else {
            eprintln!("warning: [{section}] has invalid trade_type '{trade_type_str}'; skipped");
            continue;
        };

        let sizing_type = config
            .get_string(&section, "sizing_type")
            .unwrap_or_else(|| "Quantity".to_string());
        let sizing_value = config.get_double(&section, "sizing_value", 1.0);
        let Some(sizing) = Sizing::parse(&sizing_type, sizing_value) else {
            eprintln!("warning: [{section}] has invalid sizing_type '{sizing_type}'; skipped");
            continue;
        };

        trackers.push(Tracker {
            symbol,
            strategy_name,
            trade_type,
            sizing,
        });
    }
    trackers
}

#[allow(clippy::too_many_arguments)]
fn run_backtest(
    config_path: &PathBuf,
    symbol: &str,
    strategy: &str,
    start: &str,
    end: &str,
    trade_type: &str,
    sizing_type: &str,
    sizing_value: f64,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let start = match parse_date(start, "start") {
        Ok(d) => d,
        Err(code) => return code,
    };
    let end = match parse_date(end, "end") {
        Ok(d) => d,
        Err(code) => return code,
    };

    let Some(trade_type) = TradeType::parse(trade_type) else {
        eprintln!("error: invalid --trade-type '{trade_type}' (Intraday or Positional)");
        return ExitCode::from(2);
    };
    let Some(sizing) = Sizing::parse(sizing_type, sizing_value) else {
        eprintln!("error: invalid --sizing-type '{sizing_type}' (Quantity or Amount)");
        return ExitCode::from(2);
    };

    let coordinator = match build_coordinator(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Running backtest: {strategy} on {symbol}, {start} to {end}");
    let report = match coordinator.run_backtest(symbol, strategy, start, end, trade_type, sizing) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for trade in &report.trades {
        println!(
            "{}  {}  {}  {} x{} @ {:.2}  pnl {:.2}  ({})",
            trade.timestamp.format("%Y-%m-%d %H:%M:%S"),
            trade.symbol,
            trade.strategy,
            trade.action,
            trade.quantity,
            trade.price,
            trade.pnl,
            trade.reason,
        );
    }

    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Trades:        {}", report.trades.len());
    eprintln!("Realized P&L:  {:.2}", report.total_pnl());
    if report.open_positions.is_empty() {
        eprintln!("Open at end:   none");
    } else {
        for position in &report.open_positions {
            eprintln!(
                "Open at end:   {} qty {} @ {:.2}",
                position.symbol, position.quantity, position.entry_price
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_simulate(config_path: &PathBuf, start: &str, end: &str, speed: f64) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let start = match parse_date(start, "start") {
        Ok(d) => d,
        Err(code) => return code,
    };
    let end = match parse_date(end, "end") {
        Ok(d) => d,
        Err(code) => return code,
    };

    let trackers = load_trackers(&config);
    if trackers.is_empty() {
        eprintln!("error: no trackers configured (add [tracker:<SYMBOL>] sections)");
        return ExitCode::from(2);
    }

    let coordinator = match build_coordinator(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Simulating {} tracker(s), {} to {}, at {}x",
        trackers.len(),
        start,
        end,
        speed
    );
    match coordinator.start_live_simulation(&trackers, start, end, speed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_strategies() -> ExitCode {
    for name in StrategyRegistry::builtin().names() {
        println!("{name}");
    }
    ExitCode::SUCCESS
}

fn run_positions(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let state_dir = config
        .get_string("state", "dir")
        .unwrap_or_else(|| "state".to_string());
    let store = CsvPositionStore::new(PathBuf::from(state_dir).join("positions.csv"));

    use crate::ports::state_port::PositionStorePort;
    let positions = match store.load() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if positions.is_empty() {
        eprintln!("No open positions");
        return ExitCode::SUCCESS;
    }
    for position in &positions {
        println!(
            "{}  qty {}  entry {:.2}  ({})",
            position.symbol, position.quantity, position.entry_price, position.strategy
        );
    }
    ExitCode::SUCCESS
}

fn run_history(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let state_dir = config
        .get_string("state", "dir")
        .unwrap_or_else(|| "state".to_string());
    let store = CsvTradeHistory::new(PathBuf::from(state_dir).join("trade_history.csv"));

    use crate::ports::state_port::TradeHistoryPort;
    let records = match store.load() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if records.is_empty() {
        eprintln!("No trade history");
        return ExitCode::SUCCESS;
    }
    for record in &records {
        println!(
            "{}  {}  {}  {} x{} @ {:.2}  pnl {:.2}  ({})",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.symbol,
            record.strategy,
            record.action,
            record.quantity,
            record.price,
            record.pnl,
            record.reason,
        );
    }
    ExitCode::SUCCESS
}
