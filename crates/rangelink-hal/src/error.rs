// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HAL error types

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Errors raised by bus primitives and sensor capabilities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HalError {
    /// I2C transfer failed
    #[error("bus transfer failed: {0}")]
    Bus(String),

    /// Vendor call returned a non-zero status code
    #[error("{operation} returned status {code}")]
    Status { operation: &'static str, code: i32 },

    /// Multiplexer channel outside the addressable range
    #[error("multiplexer channel {channel} out of range (max {max})")]
    InvalidChannel { channel: u8, max: u8 },

    /// Driver does not implement this capability
    #[error("{0} is not supported by this driver")]
    Unsupported(&'static str),

    /// Profile name not recognised
    #[error("unknown ranging profile '{0}'")]
    UnknownProfile(String),

    /// Operation requires ranging to be active
    #[error("sensor is not ranging")]
    NotRanging,
}

impl HalError {
    /// Shorthand for a bus failure
    pub fn bus(msg: impl Into<String>) -> Self {
        HalError::Bus(msg.into())
    }
}
