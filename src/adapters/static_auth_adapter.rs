//! Access-token auth adapter: the token comes from configuration, already
//! issued by the broker's login flow out of band.

use crate::domain::error::TickwheelError;
use crate::ports::auth_port::AuthPort;

pub struct StaticAuthAdapter {
    token: String,
}

impl StaticAuthAdapter {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

impl AuthPort for StaticAuthAdapter {
    fn get_access_token(&self) -> Result<String, TickwheelError> {
        if self.token.trim().is_empty() {
            return Err(TickwheelError::Auth {
                reason: "access token is empty".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}
