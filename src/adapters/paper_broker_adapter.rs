//! Paper trading broker: accepts every order and records it to the log
//! sink instead of transmitting it anywhere.

use std::sync::Arc;

use crate::domain::error::TickwheelError;
use crate::domain::order::OrderRequest;
use crate::ports::broker_port::BrokerPort;
use crate::ports::log_port::LogSink;

pub struct PaperBrokerAdapter {
    log: Arc<dyn LogSink>,
}

impl PaperBrokerAdapter {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self { log }
    }
}

impl BrokerPort for PaperBrokerAdapter {
    fn submit(&self, order: &OrderRequest) -> Result<(), TickwheelError> {
        self.log.log(
            "PaperBroker",
            &format!(
                "Order accepted: {} {} x{} @ {:.2} [{}]",
                order.side.as_str(),
                order.symbol,
                order.quantity,
                order.price,
                order.product_type.as_str()
            ),
        );
        Ok(())
    }
}
