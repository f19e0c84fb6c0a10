// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so a broken config file can be fixed
//! without a round trip per field.

use crate::{
    ConfigError, ConfigResult, RangelinkConfig, KNOWN_CARDINALITY_POLICIES, KNOWN_PROFILES,
};

/// Multiplexer channels addressable on a TCA9548A
pub const MAX_CHANNELS: u8 = 8;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidPort { port_name: String, port: u16 },
    InvalidAddress { field: String, address: u8 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort { port_name, port } => {
                write!(f, "Port {} = {} is not a usable UDP port", port_name, port)
            }
            Self::InvalidAddress { field, address } => {
                write!(
                    f,
                    "{} = 0x{:02X} is not a 7-bit I2C address",
                    field, address
                )
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &RangelinkConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_bus(config, &mut errors);
    validate_filter(config, &mut errors);
    validate_network(config, &mut errors);

    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn validate_bus(config: &RangelinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let bus = &config.bus;
    if bus.multiplexer_address > 0x7F {
        errors.push(ConfigValidationError::InvalidAddress {
            field: "bus.multiplexer_address".to_string(),
            address: bus.multiplexer_address,
        });
    }
    if bus.sensor_address > 0x7F {
        errors.push(ConfigValidationError::InvalidAddress {
            field: "bus.sensor_address".to_string(),
            address: bus.sensor_address,
        });
    }
    if bus.channel_count == 0 || bus.channel_count > MAX_CHANNELS {
        errors.push(ConfigValidationError::InvalidValue {
            field: "bus.channel_count".to_string(),
            reason: format!("must be between 1 and {}", MAX_CHANNELS),
        });
    }
    if !KNOWN_PROFILES.contains(&bus.profile.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "bus.profile".to_string(),
            reason: format!("must be one of: {}", KNOWN_PROFILES.join(", ")),
        });
    }
    for &channel in config
        .simulation
        .present_channels
        .iter()
        .chain(&config.simulation.faulty_channels)
    {
        if channel >= MAX_CHANNELS {
            errors.push(ConfigValidationError::InvalidValue {
                field: "simulation".to_string(),
                reason: format!("channel {} is outside 0..{}", channel, MAX_CHANNELS),
            });
        }
    }
}

fn validate_filter(config: &RangelinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let filter = &config.filter;
    if !(filter.resolution >= 2.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "filter.resolution".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }
    if !(filter.activity_threshold > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "filter.activity_threshold".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if !(filter.snap_multiplier > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "filter.snap_multiplier".to_string(),
            reason: "must be positive".to_string(),
        });
    }
}

fn validate_network(config: &RangelinkConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.stream.target_host.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "stream.target_host".to_string(),
        });
    }
    if config.stream.target_port == 0 {
        errors.push(ConfigValidationError::InvalidPort {
            port_name: "stream.target_port".to_string(),
            port: config.stream.target_port,
        });
    }
    if config.receiver.bind_host.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "receiver.bind_host".to_string(),
        });
    }
    if config.receiver.port == 0 {
        errors.push(ConfigValidationError::InvalidPort {
            port_name: "receiver.port".to_string(),
            port: config.receiver.port,
        });
    }
    if config.receiver.window_width == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "receiver.window_width".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if !KNOWN_CARDINALITY_POLICIES.contains(&config.receiver.cardinality_policy.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "receiver.cardinality_policy".to_string(),
            reason: format!("must be one of: {}", KNOWN_CARDINALITY_POLICIES.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_channels() {
        let mut config = RangelinkConfig::default();
        config.bus.channel_count = 9;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("bus.channel_count"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = RangelinkConfig::default();
        config.bus.profile = "ludicrous_speed".to_string();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("bus.profile"));
            assert!(msg.contains("high_speed"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_eight_bit_address_rejected() {
        let mut config = RangelinkConfig::default();
        config.bus.sensor_address = 0x80;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("0x80"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = RangelinkConfig::default();
        config.filter.resolution = 0.0;
        config.receiver.window_width = 0;
        config.receiver.cardinality_policy = "grow".to_string();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("filter.resolution"));
            assert!(msg.contains("receiver.window_width"));
            assert!(msg.contains("receiver.cardinality_policy"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_nan_filter_parameters_rejected() {
        let mut config = RangelinkConfig::default();
        config.filter.activity_threshold = f64::NAN;

        assert!(validate_config(&config).is_err());
    }
}
