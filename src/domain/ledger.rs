//! Shared position ledger and trade journal.
//!
//! Single source of truth for "are we flat, long, or short on X". Every
//! mutation runs under one lock covering the whole
//! read-modify-write-persist sequence, because live ticks arrive on
//! multiple worker threads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::error::TickwheelError;
use crate::domain::order::{OrderRequest, Side};
use crate::domain::position::{Position, TradeRecord};
use crate::ports::broker_port::BrokerPort;
use crate::ports::log_port::LogSink;
use crate::ports::state_port::{PositionStorePort, TradeHistoryPort};

struct LedgerInner {
    positions: HashMap<String, Position>,
    /// Records appended during this process lifetime, in append order.
    journal: Vec<TradeRecord>,
    position_store: Box<dyn PositionStorePort>,
    history_store: Box<dyn TradeHistoryPort>,
    broker: Option<Box<dyn BrokerPort>>,
}

pub struct PositionLedger {
    inner: Mutex<LedgerInner>,
    log: Arc<dyn LogSink>,
}

impl PositionLedger {
    /// Build a ledger over the given stores, restoring any open positions
    /// the position store persisted before a restart.
    pub fn new(
        position_store: Box<dyn PositionStorePort>,
        history_store: Box<dyn TradeHistoryPort>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, TickwheelError> {
        let restored = position_store.load()?;
        let mut positions = HashMap::new();
        for position in restored {
            log.log(
                "Ledger",
                &format!(
                    "Restored open position: {} qty {} ({})",
                    position.symbol, position.quantity, position.strategy
                ),
            );
            positions.insert(position.symbol.clone(), position);
        }

        Ok(PositionLedger {
            inner: Mutex::new(LedgerInner {
                positions,
                journal: Vec::new(),
                position_store,
                history_store,
                broker: None,
            }),
            log,
        })
    }

    /// Attach an order transmission endpoint. Bookkeeping happens either
    /// way; the broker is only handed the order after the books balance.
    pub fn with_broker(self, broker: Box<dyn BrokerPort>) -> Self {
        self.lock().broker = Some(broker);
        self
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        // In-memory state stays authoritative for the rest of the process,
        // so a poisoned lock is recovered rather than propagated.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Pure read: the open position for `symbol`, if one exists.
    pub fn get_open_position(&self, symbol: &str) -> Option<Position> {
        self.lock().positions.get(symbol).cloned()
    }

    /// Signed open quantity for `symbol`; 0 when flat.
    pub fn get_position_quantity(&self, symbol: &str) -> i64 {
        self.lock()
            .positions
            .get(symbol)
            .map(|p| p.quantity)
            .unwrap_or(0)
    }

    /// Snapshot of all open positions, sorted by symbol.
    pub fn open_positions(&self) -> Vec<Position> {
        let inner = self.lock();
        let mut positions: Vec<Position> = inner.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    /// Records appended during this process lifetime, in append order.
    pub fn trade_records(&self) -> Vec<TradeRecord> {
        self.lock().journal.clone()
    }

    /// Book one order: mutate the position, append a journal record,
    /// persist both stores, and emit a trade detail block.
    ///
    /// A persistence failure is logged and does not roll back the
    /// in-memory mutation.
    pub fn place_order(&self, order: OrderRequest) -> Result<(), TickwheelError> {
        let mut inner = self.lock();

        let current_quantity = inner
            .positions
            .get(&order.symbol)
            .map(|p| p.quantity)
            .unwrap_or(0);
        let new_quantity = current_quantity + order.quantity * order.side.factor();

        if new_quantity == 0 {
            inner.positions.remove(&order.symbol);
        } else if let Some(position) = inner.positions.get_mut(&order.symbol) {
            // Entry price is sticky on partial adjustments: the original
            // cost basis survives size changes.
            position.quantity = new_quantity;
        } else {
            inner.positions.insert(
                order.symbol.clone(),
                Position {
                    symbol: order.symbol.clone(),
                    quantity: new_quantity,
                    strategy: order.strategy_name.clone(),
                    entry_price: order.price,
                },
            );
        }

        let pnl = realized_pnl(&order);
        let record = TradeRecord {
            timestamp: order.timestamp,
            symbol: order.symbol.clone(),
            strategy: order.strategy_name.clone(),
            action: order.side.as_str().to_string(),
            price: order.price,
            quantity: order.quantity,
            pnl,
            reason: order
                .exit_reason
                .clone()
                .unwrap_or_else(|| "Entry".to_string()),
        };
        inner.journal.push(record.clone());

        self.log.log("Ledger", &trade_block(&order, pnl));

        let positions: Vec<Position> = inner.positions.values().cloned().collect();
        if let Err(e) = inner.position_store.save(&positions) {
            self.log
                .log("Ledger", &format!("Position store write failed: {e}"));
        }
        if let Err(e) = inner.history_store.append(&record) {
            self.log
                .log("Ledger", &format!("Trade history write failed: {e}"));
        }

        if let Some(broker) = &inner.broker {
            if let Err(e) = broker.submit(&order) {
                self.log
                    .log("Ledger", &format!("Order submission failed: {e}"));
            }
        }

        Ok(())
    }
}

/// Realized P&L for an exit order; zero for entries.
///
/// Long positions exit with a SELL, so side = Sell means
/// `(price - entry) * qty`; short positions exit with a BUY, giving
/// `(entry - price) * qty`.
fn realized_pnl(order: &OrderRequest) -> f64 {
    match (&order.exit_reason, order.entry_price) {
        (Some(_), Some(entry)) => match order.side {
            Side::Sell => (order.price - entry) * order.quantity as f64,
            Side::Buy => (entry - order.price) * order.quantity as f64,
        },
        _ => 0.0,
    }
}

fn trade_block(order: &OrderRequest, pnl: f64) -> String {
    let title = if order.is_exit() {
        "--- TRADE EXIT ---"
    } else {
        "--- TRADE ENTRY ---"
    };
    let mut block = format!(
        "{title}\n  Timestamp: {}\n  Symbol:    {}\n  Strategy:  {}\n  Action:    {} @ {}\n  Quantity:  {}\n",
        order.timestamp.format("%Y-%m-%d %H:%M:%S"),
        order.symbol,
        order.strategy_name,
        order.side.as_str(),
        order.price,
        order.quantity,
    );
    if let Some(reason) = &order.exit_reason {
        if order.entry_price.is_some() {
            block.push_str(&format!("  P&L:       {pnl:.2}\n"));
        }
        block.push_str(&format!("  Reason:    {reason}\n"));
    }
    block.push_str("--------------------");
    block
}
