// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use crate::hal::calibration::{RefCalibration, SpadInfo};
use crate::{HalError, HalResult};

/// Factory I2C address of a VL53L0X
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x29;

/// Vendor measurement profile
///
/// Trades timing budget for accuracy or range. The discriminants are the
/// mode codes the vendor API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RangingProfile {
    GoodAccuracy = 0,
    #[default]
    BetterAccuracy = 1,
    BestAccuracy = 2,
    LongRange = 3,
    HighSpeed = 4,
}

impl RangingProfile {
    pub const ALL: [RangingProfile; 5] = [
        RangingProfile::GoodAccuracy,
        RangingProfile::BetterAccuracy,
        RangingProfile::BestAccuracy,
        RangingProfile::LongRange,
        RangingProfile::HighSpeed,
    ];

    /// Mode code passed to the vendor driver
    pub fn vendor_code(self) -> u8 {
        self as u8
    }

    /// Configuration name (`better_accuracy`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            RangingProfile::GoodAccuracy => "good_accuracy",
            RangingProfile::BetterAccuracy => "better_accuracy",
            RangingProfile::BestAccuracy => "best_accuracy",
            RangingProfile::LongRange => "long_range",
            RangingProfile::HighSpeed => "high_speed",
        }
    }
}

impl fmt::Display for RangingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangingProfile {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RangingProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| HalError::UnknownProfile(s.to_string()))
    }
}

/// Ranging capability of a single ToF sensor
///
/// Implemented by vendor drivers. Every call assumes the bus has already
/// been routed to this sensor (see [`crate::SensorBus::select`]).
pub trait RangingSensor {
    /// Begin continuous ranging with the given profile
    fn start_ranging(&mut self, profile: RangingProfile) -> HalResult<()>;

    /// Stop continuous ranging
    fn stop_ranging(&mut self) -> HalResult<()>;

    /// Latest distance in millimetres
    ///
    /// Values `<= 0` are the driver's way of reporting an invalid reading.
    fn get_distance(&mut self) -> HalResult<i32>;

    /// Measurement period in microseconds
    ///
    /// Returns 0 when no sensor answers, which is how discovery tells an
    /// empty channel apart from a populated one.
    fn get_timing(&mut self) -> HalResult<u32>;

    /// Whether the sensor still answers on the bus
    fn is_connected(&mut self) -> bool {
        true
    }

    /// SPAD management: select the optimal reference SPAD set
    fn perform_spad_management(&mut self) -> HalResult<SpadInfo> {
        Err(HalError::Unsupported("perform_spad_management"))
    }

    /// Reference SPAD count and type currently in use
    fn reference_spads(&mut self) -> HalResult<SpadInfo> {
        Err(HalError::Unsupported("reference_spads"))
    }

    /// Temperature reference calibration
    fn perform_ref_calibration(&mut self) -> HalResult<RefCalibration> {
        Err(HalError::Unsupported("perform_ref_calibration"))
    }

    /// Offset calibration against a target at `distance_mm`; returns the
    /// offset in micrometres
    fn perform_offset_calibration(&mut self, _distance_mm: u32) -> HalResult<i32> {
        Err(HalError::Unsupported("perform_offset_calibration"))
    }

    /// Crosstalk calibration against a target at `distance_mm`; returns the
    /// compensation rate in MCPS (16.16 fixed point)
    fn perform_crosstalk_calibration(&mut self, _distance_mm: u32) -> HalResult<u32> {
        Err(HalError::Unsupported("perform_crosstalk_calibration"))
    }

    /// Move the sensor to a new 7-bit I2C address
    fn set_device_address(&mut self, _address: u8) -> HalResult<()> {
        Err(HalError::Unsupported("set_device_address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_vendor_codes() {
        assert_eq!(RangingProfile::GoodAccuracy.vendor_code(), 0);
        assert_eq!(RangingProfile::BetterAccuracy.vendor_code(), 1);
        assert_eq!(RangingProfile::BestAccuracy.vendor_code(), 2);
        assert_eq!(RangingProfile::LongRange.vendor_code(), 3);
        assert_eq!(RangingProfile::HighSpeed.vendor_code(), 4);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(
            "long_range".parse::<RangingProfile>().unwrap(),
            RangingProfile::LongRange
        );
        assert_eq!(
            "High-Speed".parse::<RangingProfile>().unwrap(),
            RangingProfile::HighSpeed
        );
        assert!("warp".parse::<RangingProfile>().is_err());
    }

    #[test]
    fn test_profile_names_round_trip() {
        for profile in RangingProfile::ALL {
            assert_eq!(profile.as_str().parse::<RangingProfile>().unwrap(), profile);
        }
    }
}
