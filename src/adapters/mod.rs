//! Concrete adapter implementations for ports.

pub mod csv_data_adapter;
pub mod csv_state_adapter;
pub mod file_config_adapter;
pub mod log_adapter;
pub mod memory_state_adapter;
pub mod paper_broker_adapter;
pub mod replay_feed_adapter;
pub mod static_auth_adapter;
