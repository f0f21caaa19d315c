//! Port traits: the narrow interfaces the domain uses to reach the outside
//! world. Implementations live in [`crate::adapters`].

pub mod config_port;
pub mod data_port;
pub mod fundamentals_port;
pub mod notification_port;
pub mod subscriber_port;
