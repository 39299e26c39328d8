//! Durable state store port traits.

use crate::domain::error::TickwheelError;
use crate::domain::position::{Position, TradeRecord};

/// Open-positions store, keyed by symbol.
///
/// The ledger overwrites the store wholesale after every mutation; the
/// store's only job is to return the same records on the next load.
pub trait PositionStorePort: Send {
    fn load(&self) -> Result<Vec<Position>, TickwheelError>;

    fn save(&mut self, positions: &[Position]) -> Result<(), TickwheelError>;
}

/// Append-only trade history store.
pub trait TradeHistoryPort: Send {
    fn load(&self) -> Result<Vec<TradeRecord>, TickwheelError>;

    fn append(&mut self, record: &TradeRecord) -> Result<(), TickwheelError>;
}
