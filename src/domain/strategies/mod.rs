//! Built-in strategy implementations.
//!
//! Every strategy follows the same pattern: aggregate ticks into rolling
//! windows or fixed-duration buckets, derive a signal, gate by current
//! ledger state, place at most one order per tick.

pub mod fifteen_min_breakdown;
pub mod opening_breakout;
pub mod sma_crossover;
pub mod swing_breakout;
