// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink-observability
//!
//! Logging setup shared by the rangelink tools: `tracing-subscriber` with an
//! `EnvFilter` built from the positional verbosity word and per-crate debug
//! flags.
//!
//! ## Features
//! - `file-logging`: JSON log file per run with retention (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Crate names accepted by `--debug-{crate}`
pub const KNOWN_CRATES: &[&str] = &[
    "rangelink",
    "rangelink-config",
    "rangelink-hal",
    "rangelink-acquisition",
    "rangelink-smoothing",
    "rangelink-serialization",
    "rangelink-transports",
];
