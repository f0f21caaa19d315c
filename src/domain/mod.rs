//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod frame;
pub mod signal;
pub mod market_trend;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod batch;
pub mod notification;
pub mod scan;
pub mod universe;
pub mod config_validation;
pub mod error;
