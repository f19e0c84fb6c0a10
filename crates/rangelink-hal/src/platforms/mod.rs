// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Platform implementations
///
/// Each platform module implements the HAL traits defined in `crate::hal`.
///
/// Available platforms:
/// - Simulated bus with in-memory sensors
/// - Linux `/dev/i2c-*` with a vendor VL53L0X driver - future

#[cfg(feature = "simulated")]
pub mod simulated;

#[cfg(feature = "simulated")]
pub use simulated::SimulatedBus;
