pub mod auth_port;
pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod feed_port;
pub mod log_port;
pub mod state_port;
