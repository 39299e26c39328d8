//! CSV-backed state stores used by live and simulated sessions.
//!
//! Open positions are rewritten wholesale on every save so the file always
//! mirrors the in-memory ledger. Trade history is append-only.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::error::TickwheelError;
use crate::domain::position::{Position, TradeRecord};
use crate::ports::state_port::{PositionStorePort, TradeHistoryPort};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize, Deserialize)]
struct PositionRow {
    symbol: String,
    quantity: i64,
    strategy: String,
    entry_price: f64,
}

#[derive(Serialize, Deserialize)]
struct TradeRow {
    timestamp: String,
    symbol: String,
    strategy: String,
    action: String,
    price: f64,
    quantity: i64,
    pnl: f64,
    reason: String,
}

fn store_error(store: &str, reason: impl std::fmt::Display) -> TickwheelError {
    TickwheelError::Persistence {
        store: store.to_string(),
        reason: reason.to_string(),
    }
}

pub struct CsvPositionStore {
    path: PathBuf,
}

impl CsvPositionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PositionStorePort for CsvPositionStore {
    fn load(&self) -> Result<Vec<Position>, TickwheelError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr =
            csv::Reader::from_path(&self.path).map_err(|e| store_error("positions", e))?;
        let mut positions = Vec::new();
        for row in rdr.deserialize::<PositionRow>() {
            let row = row.map_err(|e| store_error("positions", e))?;
            positions.push(Position {
                symbol: row.symbol,
                quantity: row.quantity,
                strategy: row.strategy,
                entry_price: row.entry_price,
            });
        }
        Ok(positions)
    }

    fn save(&mut self, positions: &[Position]) -> Result<(), TickwheelError> {
        let mut wtr =
            csv::Writer::from_path(&self.path).map_err(|e| store_error("positions", e))?;
        for position in positions {
            wtr.serialize(PositionRow {
                symbol: position.symbol.clone(),
                quantity: position.quantity,
                strategy: position.strategy.clone(),
                entry_price: position.entry_price,
            })
            .map_err(|e| store_error("positions", e))?;
        }
        wtr.flush().map_err(|e| store_error("positions", e))
    }
}

pub struct CsvTradeHistory {
    path: PathBuf,
}

impl CsvTradeHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TradeHistoryPort for CsvTradeHistory {
    fn load(&self) -> Result<Vec<TradeRecord>, TickwheelError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr =
            csv::Reader::from_path(&self.path).map_err(|e| store_error("trade history", e))?;
        let mut records = Vec::new();
        for row in rdr.deserialize::<TradeRow>() {
            let row = row.map_err(|e| store_error("trade history", e))?;
            let timestamp = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| store_error("trade history", e))?;
            records.push(TradeRecord {
                timestamp,
                symbol: row.symbol,
                strategy: row.strategy,
                action: row.action,
                price: row.price,
                quantity: row.quantity,
                pnl: row.pnl,
                reason: row.reason,
            });
        }
        Ok(records)
    }

    fn append(&mut self, record: &TradeRecord) -> Result<(), TickwheelError> {
        let need_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| store_error("trade history", e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(need_header)
            .from_writer(file);
        wtr.serialize(TradeRow {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            symbol: record.symbol.clone(),
            strategy: record.strategy.clone(),
            action: record.action.clone(),
            price: record.price,
            quantity: record.quantity,
            pnl: record.pnl,
            reason: record.reason.clone(),
        })
        .map_err(|e| store_error("trade history", e))?;
        wtr.flush().map_err(|e| store_error("trade history", e))
    }
}
