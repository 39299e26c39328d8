//! Broker authentication port trait.

use crate::domain::error::TickwheelError;

/// Black-box token provider. The session coordinator calls this once per
/// session start and caches the result; a failure aborts the start.
pub trait AuthPort: Send + Sync {
    fn get_access_token(&self) -> Result<String, TickwheelError>;
}
