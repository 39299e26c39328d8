//! Open position and trade journal records.

use chrono::NaiveDateTime;

/// Current net holding in one symbol.
///
/// At most one open position exists per symbol; a flat symbol has no entry
/// at all (entries are removed, never zeroed). The `strategy` field marks
/// exclusive ownership: only the named strategy may act on this symbol
/// while the position is open.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    /// Signed: positive = long, negative = short.
    pub quantity: i64,
    pub strategy: String,
    /// Price of the order that opened the position. Sticky: partial
    /// adjustments do not overwrite it.
    pub entry_price: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn is_owned_by(&self, strategy_name: &str) -> bool {
        self.strategy == strategy_name
    }
}

/// Immutable record of one fill, appended to the trade journal.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub strategy: String,
    /// "BUY" or "SELL".
    pub action: String,
    pub price: f64,
    pub quantity: i64,
    /// Realized P&L; zero for entries.
    pub pnl: f64,
    /// "Entry" or the specific exit cause.
    pub reason: String,
}
