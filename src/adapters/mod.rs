//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_fundamentals_adapter;
pub mod csv_subscriber_adapter;
pub mod file_config_adapter;
pub mod text_notifier;
