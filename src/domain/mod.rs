//! Core domain types and logic.

pub mod candle;
pub mod dispatcher;
pub mod error;
pub mod indicator;
pub mod ledger;
pub mod order;
pub mod position;
pub mod session;
pub mod strategies;
pub mod strategy;
pub mod tick;
