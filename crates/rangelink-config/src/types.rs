// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `rangelink.toml`. Every section is optional; missing values fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ranging profile names accepted in `bus.profile`
pub const KNOWN_PROFILES: &[&str] = &[
    "good_accuracy",
    "better_accuracy",
    "best_accuracy",
    "long_range",
    "high_speed",
];

/// Cardinality policy names accepted in `receiver.cardinality_policy`
pub const KNOWN_CARDINALITY_POLICIES: &[&str] = &["reject", "resize"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RangelinkConfig {
    pub bus: BusConfig,
    pub sampling: SamplingConfig,
    pub filter: FilterConfig,
    pub stream: StreamConfig,
    pub receiver: ReceiverConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

/// Sensor bus and multiplexer layout
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Sensors sit behind an address multiplexer
    pub multiplexed: bool,
    pub multiplexer_address: u8,
    pub sensor_address: u8,
    /// Number of multiplexer channels walked during discovery
    pub channel_count: u8,
    /// Ranging profile used when starting the session
    pub profile: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            multiplexed: true,
            multiplexer_address: 0x70,
            sensor_address: 0x29,
            channel_count: 8,
            profile: "better_accuracy".to_string(),
        }
    }
}

/// Acquisition loop settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Floor applied to the timing-budget derived cycle delay
    pub min_cycle_ms: u64,
    /// Run the adaptive filter on the sender before encoding
    pub filter_before_send: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            min_cycle_ms: 20,
            filter_before_send: false,
        }
    }
}

/// Adaptive filter parameters (shared by sender and receiver)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub sleep_enable: bool,
    pub activity_threshold: f64,
    pub resolution: f64,
    pub snap_multiplier: f64,
    pub snap_enable: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sleep_enable: true,
            activity_threshold: 2.5,
            resolution: 8192.0,
            snap_multiplier: 0.5,
            snap_enable: false,
        }
    }
}

/// Sender side of the datagram stream
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    pub target_host: String,
    pub target_port: u16,
    /// Local address the sending socket binds to
    pub bind_address: String,
    /// Announce the sensor count with a discovery frame before streaming
    pub send_discovery_frame: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            target_host: "127.0.0.1".to_string(),
            target_port: 5005,
            bind_address: "0.0.0.0:0".to_string(),
            send_discovery_frame: true,
        }
    }
}

impl StreamConfig {
    /// `host:port` of the consumer
    pub fn target(&self) -> String {
        format!("{}:{}", self.target_host, self.target_port)
    }
}

/// Receiving side of the datagram stream
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub bind_host: String,
    pub port: u16,
    /// Plot window width in samples before the series are cleared
    pub window_width: usize,
    pub filter_enabled: bool,
    /// `reject` or `resize`
    pub cardinality_policy: String,
    /// Socket read timeout so the loop can observe shutdown (0 = blocking)
    pub read_timeout_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5005,
            window_width: 100,
            filter_enabled: true,
            cardinality_policy: "reject".to_string(),
            read_timeout_ms: 500,
        }
    }
}

impl ReceiverConfig {
    /// `host:port` the receiver binds to
    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when no verbosity argument is given
    pub level: String,
    /// Also write JSON logs under `log_dir` (requires the `file-logging` feature)
    pub file_logging: bool,
    pub log_dir: PathBuf,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_runs: 10,
        }
    }
}

/// Simulated sensor platform used when no vendor driver is linked in
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Multiplexer channels with a responding sensor
    pub present_channels: Vec<u8>,
    /// Channels whose distance reads always fail
    pub faulty_channels: Vec<u8>,
    pub base_distance_mm: u32,
    /// Distance added per channel index so each sensor reads differently
    pub distance_step_mm: u32,
    /// Peak noise amplitude added to every reading
    pub noise_mm: u32,
    pub timing_budget_us: u32,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            present_channels: vec![0, 1],
            faulty_channels: Vec::new(),
            base_distance_mm: 300,
            distance_step_mm: 40,
            noise_mm: 3,
            timing_budget_us: 33_000,
            seed: 42,
        }
    }
}
