//! End-to-end tests wiring real adapters through the session coordinator.

mod common;

use common::*;
use std::sync::Arc;
use tempfile::TempDir;
use tickwheel::adapters::csv_data_adapter::CsvDataAdapter;
use tickwheel::adapters::csv_state_adapter::{CsvPositionStore, CsvTradeHistory};
use tickwheel::adapters::log_adapter::ChannelLogAdapter;
use tickwheel::adapters::memory_state_adapter::{MemoryPositionStore, MemoryTradeHistory};
use tickwheel::adapters::static_auth_adapter::StaticAuthAdapter;
use tickwheel::domain::ledger::PositionLedger;
use tickwheel::domain::order::{OrderKind, OrderRequest, ProductType, Side, TradeType};
use tickwheel::domain::session::SessionCoordinator;
use tickwheel::domain::strategy::{Sizing, StrategyContext, StrategyRegistry, Tracker};
use tickwheel::ports::log_port::LogSink;
use tickwheel::ports::state_port::{PositionStorePort, TradeHistoryPort};

fn memory_coordinator(data: MockDataPort) -> SessionCoordinator {
    let (log, _rx) = ChannelLogAdapter::pair();
    let log: Arc<dyn LogSink> = Arc::new(log);
    let ledger = Arc::new(
        PositionLedger::new(
            Box::new(MemoryPositionStore::new()),
            Box::new(MemoryTradeHistory::new()),
            Arc::clone(&log),
        )
        .unwrap(),
    );
    SessionCoordinator::new(
        Box::new(StaticAuthAdapter::new("token".to_string())),
        Box::new(data),
        ledger,
        StrategyRegistry::builtin(),
        log,
    )
}

#[test]
fn backtests_are_idempotent_across_runs() {
    let coordinator =
        memory_coordinator(MockDataPort::new().with_candles(SYMBOL, crossover_candles()));
    let day = date(2024, 1, 15);

    let first = coordinator
        .run_backtest(
            SYMBOL,
            "SMA Crossover",
            day,
            day,
            TradeType::Intraday,
            Sizing::Quantity(5),
        )
        .unwrap();
    let second = coordinator
        .run_backtest(
            SYMBOL,
            "SMA Crossover",
            day,
            day,
            TradeType::Intraday,
            Sizing::Quantity(5),
        )
        .unwrap();

    assert_eq!(first.trades.len(), 2);
    assert_eq!(first.trades, second.trades);
    assert_eq!(first.open_positions, second.open_positions);
}

#[test]
fn simulation_end_to_end_persists_through_csv_stores() {
    let data_dir = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    write_candles_csv(data_dir.path(), SYMBOL, &crossover_candles());

    let (log, _rx) = ChannelLogAdapter::pair();
    let log: Arc<dyn LogSink> = Arc::new(log);
    let ledger = Arc::new(
        PositionLedger::new(
            Box::new(CsvPositionStore::new(state_dir.path().join("positions.csv"))),
            Box::new(CsvTradeHistory::new(
                state_dir.path().join("trade_history.csv"),
            )),
            Arc::clone(&log),
        )
        .unwrap(),
    );
    let coordinator = SessionCoordinator::new(
        Box::new(StaticAuthAdapter::new("token".to_string())),
        Box::new(CsvDataAdapter::new(data_dir.path().to_path_buf())),
        ledger,
        StrategyRegistry::builtin(),
        log,
    );

    let tracker = Tracker {
        symbol: SYMBOL.to_string(),
        strategy_name: "SMA Crossover".to_string(),
        trade_type: TradeType::Intraday,
        sizing: Sizing::Quantity(5),
    };
    let day = date(2024, 1, 15);
    coordinator
        .start_live_simulation(&[tracker], day, day, 60_000.0)
        .unwrap();

    // Round trip happened and reached disk: two journal rows, flat book.
    let history = CsvTradeHistory::new(state_dir.path().join("trade_history.csv"));
    let records = history.load().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, "BUY");
    assert_eq!(records[0].price, 110.0);
    assert_eq!(records[1].action, "SELL");
    assert_eq!(records[1].pnl, -500.0);

    let store = CsvPositionStore::new(state_dir.path().join("positions.csv"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn restart_restores_positions_and_entry_price() {
    let state_dir = TempDir::new().unwrap();
    let positions_path = state_dir.path().join("positions.csv");
    let history_path = state_dir.path().join("trade_history.csv");

    let (log, _rx) = ChannelLogAdapter::pair();
    let log: Arc<dyn LogSink> = Arc::new(log);
    let ledger = PositionLedger::new(
        Box::new(CsvPositionStore::new(positions_path.clone())),
        Box::new(CsvTradeHistory::new(history_path.clone())),
        Arc::clone(&log),
    )
    .unwrap();

    ledger
        .place_order(OrderRequest {
            symbol: SYMBOL.to_string(),
            quantity: 5,
            side: Side::Buy,
            kind: OrderKind::Market,
            product_type: ProductType::Intraday,
            timestamp: session_open(),
            strategy_name: "SMA Crossover".to_string(),
            entry_price: None,
            exit_reason: None,
            price: 110.0,
        })
        .unwrap();
    drop(ledger);

    // Process restart: a fresh ledger over the same files.
    let (log, _rx) = ChannelLogAdapter::pair();
    let log: Arc<dyn LogSink> = Arc::new(log);
    let restored = Arc::new(
        PositionLedger::new(
            Box::new(CsvPositionStore::new(positions_path)),
            Box::new(CsvTradeHistory::new(history_path)),
            log,
        )
        .unwrap(),
    );

    let position = restored.get_open_position(SYMBOL).unwrap();
    assert_eq!(position.quantity, 5);
    assert_eq!(position.strategy, "SMA Crossover");
    assert_eq!(position.entry_price, 110.0);

    // The owning strategy recovers its entry price; others see the symbol
    // as occupied.
    let ctx = StrategyContext {
        symbol: SYMBOL.to_string(),
        ledger: restored,
        trade_type: TradeType::Intraday,
        sizing: Sizing::Quantity(5),
    };
    assert_eq!(ctx.restored_entry_price("SMA Crossover"), Some(110.0));
    assert_eq!(ctx.restored_entry_price("Opening Breakout"), None);
}

#[test]
fn data_fetch_failure_aborts_run_without_poisoning_coordinator() {
    let coordinator =
        memory_coordinator(MockDataPort::new().with_error(SYMBOL, "connection reset"));
    let day = date(2024, 1, 15);

    let err = coordinator
        .run_backtest(
            SYMBOL,
            "SMA Crossover",
            day,
            day,
            TradeType::Intraday,
            Sizing::Quantity(5),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        tickwheel::domain::error::TickwheelError::DataFetch { .. }
    ));

    // The coordinator is idle again and usable.
    let tracker = Tracker {
        symbol: "NSE:OTHER-EQ".to_string(),
        strategy_name: "SMA Crossover".to_string(),
        trade_type: TradeType::Intraday,
        sizing: Sizing::Quantity(5),
    };
    coordinator
        .start_live_simulation(&[tracker], day, day, 1.0)
        .unwrap();
}
