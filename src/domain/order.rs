//! Order vocabulary shared by the ledger and strategies.

use chrono::NaiveDateTime;

/// Direction of an order: +1 buy, -1 sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed multiplier applied to a quantity.
    pub fn factor(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit,
}

/// Whether a tracker trades intraday (auto-squared-off) or positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeType {
    Intraday,
    Positional,
}

impl TradeType {
    /// Broker-facing product classification for this trade type.
    pub fn product_type(self) -> ProductType {
        match self {
            TradeType::Intraday => ProductType::Intraday,
            TradeType::Positional => ProductType::CashAndCarry,
        }
    }

    pub fn parse(value: &str) -> Option<TradeType> {
        match value {
            "Intraday" => Some(TradeType::Intraday),
            "Positional" => Some(TradeType::Positional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Intraday,
    CashAndCarry,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Intraday => "INTRADAY",
            ProductType::CashAndCarry => "CNC",
        }
    }
}

/// Everything the ledger needs to book one order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    /// Unsigned size; direction comes from `side`.
    pub quantity: i64,
    pub side: Side,
    pub kind: OrderKind,
    pub product_type: ProductType,
    pub timestamp: NaiveDateTime,
    pub strategy_name: String,
    /// Entry price of the position being exited, when known.
    pub entry_price: Option<f64>,
    /// Present on exits only; entries have no reason.
    pub exit_reason: Option<String>,
    /// Execution price assumed for bookkeeping.
    pub price: f64,
}

impl OrderRequest {
    pub fn is_exit(&self) -> bool {
        self.exit_reason.is_some()
    }
}
