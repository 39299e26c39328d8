//! Order transmission port trait.

use crate::domain::error::TickwheelError;
use crate::domain::order::OrderRequest;

/// Outbound order submission endpoint.
///
/// The ledger's bookkeeping and journal side effects are the contract;
/// transmission is optional and the shipped adapter is a paper broker
/// that records nothing beyond a log line.
pub trait BrokerPort: Send {
    fn submit(&self, order: &OrderRequest) -> Result<(), TickwheelError>;
}
