// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink Configuration System
//!
//! Type-safe configuration loader for the range streamer, the receiver and the
//! calibration tool. Values come from three tiers, each overriding the last:
//! - `rangelink.toml` (file defaults, every section optional)
//! - `RANGELINK_*` environment variables
//! - CLI arguments collected by the binaries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rangelink_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Streaming to {}:{}", config.stream.target_host, config.stream.target_port);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the configuration file searched for on disk
pub const CONFIG_FILE_NAME: &str = "rangelink.toml";

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Why a configuration could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `rangelink.toml` where one was required
    #[error("no rangelink.toml found: {0}")]
    FileNotFound(String),

    #[error("cannot read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML syntax or a value of the wrong type
    #[error("bad TOML: {0}")]
    ParseError(String),

    /// Semantic checks failed; the message lists every problem
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.message().to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
