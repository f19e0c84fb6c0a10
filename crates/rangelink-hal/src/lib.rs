// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink-hal
//!
//! Platform abstraction for time-of-flight ranging sensors.
//!
//! This crate provides:
//! - **HAL traits** (`hal` module) - the ranging capability every sensor
//!   driver exposes and the bus context that hands out driver handles
//! - **Multiplexer** - TCA9548A channel selection over any `embedded-hal` I2C bus
//! - **Platform implementations** (`platforms` module) - a simulated bus for
//!   running the tools and tests without hardware
//!
//! ## Feature Flags
//! - `simulated` (default) - in-memory sensors with seeded noise

/// Hardware abstraction traits shared by all platforms.
pub mod hal;

/// Concrete platform implementations.
pub mod platforms;

mod error;

pub use error::{HalError, HalResult};
pub use hal::{
    CalibrationRequest, CalibrationResult, DeviceAddress, MultiplexedBus,
    RangingProfile, RangingSensor, RefCalibration, SensorBus, SpadInfo, Tca9548a,
    DEFAULT_MULTIPLEXER_ADDRESS, DEFAULT_SENSOR_ADDRESS, MAX_CHANNELS,
};

#[cfg(feature = "simulated")]
pub use platforms::simulated::{
    BusEvent, SimulatedBus, SimulatedBusMonitor, SimulatedSensor, SimulatedSensorSpec,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used imports
pub mod prelude {
    pub use crate::hal::{DeviceAddress, RangingProfile, RangingSensor, SensorBus};
    pub use crate::{HalError, HalResult};
}
