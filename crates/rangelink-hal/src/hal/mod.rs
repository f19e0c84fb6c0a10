// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Sensor bus context (addressing and driver handles).
pub mod bus;
/// Vendor calibration routines and their results.
pub mod calibration;
/// TCA9548A I2C multiplexer.
pub mod multiplexer;
/// Ranging capability and measurement profiles.
pub mod ranging;

pub use bus::{DeviceAddress, MultiplexedBus, SensorBus};
pub use calibration::{CalibrationRequest, CalibrationResult, RefCalibration, SpadInfo};
pub use multiplexer::{Tca9548a, DEFAULT_MULTIPLEXER_ADDRESS, MAX_CHANNELS};
pub use ranging::{RangingProfile, RangingSensor, DEFAULT_SENSOR_ADDRESS};
