//! Socket addresses, timeouts and size limits shared by the transports

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest datagram a rangelink receiver reads
pub const DEFAULT_MAX_DATAGRAM: usize = 128;

/// Where a transport talks to and how long it waits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address to bind (receiver) or send to (sender)
    pub address: String,

    /// Local bind address for senders (None = any interface, ephemeral port)
    pub bind_address: Option<String>,

    /// Timeout for blocking receives (None = block forever)
    pub timeout: Option<Duration>,

    /// Maximum datagram size
    pub max_message_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5005".to_string(),
            bind_address: None,
            timeout: Some(Duration::from_millis(500)),
            max_message_size: DEFAULT_MAX_DATAGRAM,
        }
    }
}

impl TransportConfig {
    /// Defaults plus `address`
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Pin the sender to a local interface or port
    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = Some(bind_address.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Receives block until a datagram arrives
    pub fn with_no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Datagrams above `size` bytes are refused on send and dropped on receive
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Reject settings no socket can honour
    pub fn validate(&self) -> Result<(), String> {
        if self.address.is_empty() {
            return Err("address is empty".to_string());
        }
        if self.max_message_size == 0 {
            return Err("max_message_size is 0".to_string());
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err("a zero timeout would never wait; use with_no_timeout to block".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_validate() {
        let config = TransportConfig::new("10.0.0.2:6000")
            .with_bind_address("0.0.0.0:0")
            .with_no_timeout()
            .with_max_message_size(64);
        assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:0"));
        assert_eq!(config.timeout, None);
        assert!(config.validate().is_ok());

        assert!(TransportConfig::new("").validate().is_err());
        assert!(TransportConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
