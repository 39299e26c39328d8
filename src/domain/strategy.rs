//! Strategy contract, sizing, and the startup-time registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::error::TickwheelError;
use crate::domain::ledger::PositionLedger;
use crate::domain::order::{OrderKind, OrderRequest, ProductType, Side, TradeType};
use crate::domain::position::Position;
use crate::domain::tick::Tick;

/// One trading rule as a tick-driven state machine.
///
/// Implementations must gate on ledger ownership first: a position held by
/// another strategy makes the symbol unavailable, and `on_tick` must return
/// without acting.
pub trait Strategy: Send {
    /// Stable unique name, also the ownership tag on positions.
    fn name(&self) -> &'static str;

    fn on_tick(&mut self, timestamp: NaiveDateTime, tick: &Tick) -> Result<(), TickwheelError>;
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name()).finish()
    }
}

/// How a signal is converted into an order size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Fixed number of shares.
    Quantity(i64),
    /// Capital amount; size = floor(amount / price).
    Amount(f64),
}

impl Sizing {
    /// Trade quantity for the given price; 0 when the price is invalid or
    /// the amount cannot buy a single share.
    pub fn calculate_quantity(&self, price: f64) -> i64 {
        if price <= 0.0 {
            return 0;
        }
        match *self {
            Sizing::Quantity(n) => n,
            Sizing::Amount(amount) => {
                if amount < price {
                    return 0;
                }
                (amount / price).floor() as i64
            }
        }
    }

    pub fn parse(sizing_type: &str, sizing_value: f64) -> Option<Sizing> {
        match sizing_type {
            "Quantity" => Some(Sizing::Quantity(sizing_value as i64)),
            "Amount" => Some(Sizing::Amount(sizing_value)),
            _ => None,
        }
    }
}

/// What the ledger says about this strategy's symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionView {
    Flat,
    /// Open position owned by this strategy.
    Mine(Position),
    /// Open position owned by a different strategy; the symbol is
    /// unavailable until it clears.
    Foreign,
}

/// Shared per-instance wiring every concrete strategy holds.
#[derive(Clone)]
pub struct StrategyContext {
    pub symbol: String,
    pub ledger: Arc<PositionLedger>,
    pub trade_type: TradeType,
    pub sizing: Sizing,
}

impl StrategyContext {
    pub fn product_type(&self) -> ProductType {
        self.trade_type.product_type()
    }

    /// Non-overridable sizing helper shared by all strategies.
    pub fn quantity_for(&self, price: f64) -> i64 {
        self.sizing.calculate_quantity(price)
    }

    /// The mandatory first check in every `on_tick`.
    pub fn position_view(&self, own_name: &str) -> PositionView {
        match self.ledger.get_open_position(&self.symbol) {
            None => PositionView::Flat,
            Some(pos) if pos.is_owned_by(own_name) => PositionView::Mine(pos),
            Some(_) => PositionView::Foreign,
        }
    }

    /// Entry price to restore after a restart, when the persisted position
    /// belongs to `own_name`. Rolling state is gone; only the position's
    /// consequence survives.
    pub fn restored_entry_price(&self, own_name: &str) -> Option<f64> {
        match self.position_view(own_name) {
            PositionView::Mine(pos) => Some(pos.entry_price),
            _ => None,
        }
    }

    /// Book a market entry at `price`.
    pub fn place_entry(
        &self,
        own_name: &str,
        timestamp: NaiveDateTime,
        side: Side,
        quantity: i64,
        price: f64,
    ) -> Result<(), TickwheelError> {
        self.ledger.place_order(OrderRequest {
            symbol: self.symbol.clone(),
            quantity,
            side,
            kind: OrderKind::Market,
            product_type: self.product_type(),
            timestamp,
            strategy_name: own_name.to_string(),
            entry_price: None,
            exit_reason: None,
            price,
        })
    }

    /// Book a market exit at `price` for the stated reason.
    #[allow(clippy::too_many_arguments)]
    pub fn place_exit(
        &self,
        own_name: &str,
        timestamp: NaiveDateTime,
        side: Side,
        quantity: i64,
        price: f64,
        entry_price: Option<f64>,
        reason: &str,
    ) -> Result<(), TickwheelError> {
        self.ledger.place_order(OrderRequest {
            symbol: self.symbol.clone(),
            quantity,
            side,
            kind: OrderKind::Market,
            product_type: self.product_type(),
            timestamp,
            strategy_name: own_name.to_string(),
            entry_price,
            exit_reason: Some(reason.to_string()),
            price,
        })
    }
}

/// One configured (symbol, strategy) pairing for a session.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub symbol: String,
    pub strategy_name: String,
    pub trade_type: TradeType,
    pub sizing: Sizing,
}

pub type StrategyFactory = fn(StrategyContext) -> Box<dyn Strategy>;

/// Explicit name-to-factory mapping, populated by registration at startup.
pub struct StrategyRegistry {
    factories: BTreeMap<&'static str, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        StrategyRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// All built-in strategies.
    pub fn builtin() -> Self {
        use crate::domain::strategies;

        let mut registry = StrategyRegistry::new();
        registry.register(
            strategies::sma_crossover::NAME,
            strategies::sma_crossover::factory,
        );
        registry.register(
            strategies::opening_breakout::NAME,
            strategies::opening_breakout::factory,
        );
        registry.register(
            strategies::fifteen_min_breakdown::NAME,
            strategies::fifteen_min_breakdown::factory,
        );
        registry.register(
            strategies::swing_breakout::NAME,
            strategies::swing_breakout::factory,
        );
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: StrategyFactory) {
        self.factories.insert(name, factory);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate the named strategy over the given context.
    pub fn build(
        &self,
        name: &str,
        context: StrategyContext,
    ) -> Result<Box<dyn Strategy>, TickwheelError> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory(context)),
            None => Err(TickwheelError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
