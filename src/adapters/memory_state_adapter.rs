//! In-memory state stores. Backtests use these so a run never touches the
//! live persistence files; tests use them for the same reason.

use crate::domain::error::TickwheelError;
use crate::domain::position::{Position, TradeRecord};
use crate::ports::state_port::{PositionStorePort, TradeHistoryPort};

pub struct MemoryPositionStore {
    positions: Vec<Position>,
    fail_saves: bool,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        MemoryPositionStore {
            positions: Vec::new(),
            fail_saves: false,
        }
    }

    /// Start with pre-seeded positions, as if restored from disk.
    pub fn with_positions(positions: Vec<Position>) -> Self {
        MemoryPositionStore {
            positions,
            fail_saves: false,
        }
    }

    /// Make every `save` fail, for exercising degraded-persistence paths.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }
}

impl Default for MemoryPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionStorePort for MemoryPositionStore {
    fn load(&self) -> Result<Vec<Position>, TickwheelError> {
        Ok(self.positions.clone())
    }

    fn save(&mut self, positions: &[Position]) -> Result<(), TickwheelError> {
        if self.fail_saves {
            return Err(TickwheelError::Persistence {
                store: "positions".into(),
                reason: "in-memory store configured to fail".into(),
            });
        }
        self.positions = positions.to_vec();
        Ok(())
    }
}

pub struct MemoryTradeHistory {
    records: Vec<TradeRecord>,
}

impl MemoryTradeHistory {
    pub fn new() -> Self {
        MemoryTradeHistory {
            records: Vec::new(),
        }
    }
}

impl Default for MemoryTradeHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeHistoryPort for MemoryTradeHistory {
    fn load(&self) -> Result<Vec<TradeRecord>, TickwheelError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, record: &TradeRecord) -> Result<(), TickwheelError> {
        self.records.push(record.clone());
        Ok(())
    }
}
