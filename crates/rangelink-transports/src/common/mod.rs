//! Common types and utilities for all transports

pub mod config;
pub mod error;
pub mod stats;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use stats::StatsCounters;
