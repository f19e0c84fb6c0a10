// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for sensor acquisition

use rangelink_hal::HalError;

use crate::device::DeviceState;

/// Result type alias using AcquisitionError
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

/// Errors raised while discovering or driving devices
///
/// Only `NoDevices` ends a session. The rest are reported per device and
/// the other devices carry on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AcquisitionError {
    /// Bus transfer failed for one device
    #[error("bus fault on device {index}: {source}")]
    BusFault { index: usize, source: HalError },

    /// Nothing answered on a channel (excluded from the session)
    #[error("probe inconclusive on channel {channel}: {reason}")]
    ProbeInconclusive { channel: u8, reason: String },

    /// start_ranging failed for one device
    #[error("device {index} failed to start: {source}")]
    StartFailed { index: usize, source: HalError },

    /// stop_ranging failed for one device
    #[error("device {index} failed to stop: {source}")]
    StopFailed { index: usize, source: HalError },

    /// Calibration routine returned an error status
    #[error("calibration of device {index} failed: {source}")]
    CalibrationFailed { index: usize, source: HalError },

    /// Device is not in the state the operation needs
    #[error("device {index} is {actual:?}, expected {expected:?}")]
    InvalidState {
        index: usize,
        expected: DeviceState,
        actual: DeviceState,
    },

    #[error("no device with index {0}")]
    UnknownDevice(usize),

    #[error("0x{0:02X} is not a 7-bit I2C address")]
    InvalidAddress(u8),

    /// Enumeration found nothing to range with
    #[error("no connected devices found")]
    NoDevices,
}

impl AcquisitionError {
    /// Whether the session can continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, AcquisitionError::NoDevices)
    }
}
