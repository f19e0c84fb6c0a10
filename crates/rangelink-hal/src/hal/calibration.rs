// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Reference SPAD selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpadInfo {
    pub spad_count: u32,
    /// Aperture SPADs (true) or non-aperture (false)
    pub is_aperture: bool,
}

/// Temperature reference calibration values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCalibration {
    pub vhv_settings: u8,
    pub phase_cal: u8,
}

/// A calibration routine to run on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationRequest {
    SpadManagement,
    ReferenceSpads,
    Reference,
    /// Target placed at the given distance (mm)
    Offset { distance_mm: u32 },
    /// Target placed at the given distance (mm)
    Crosstalk { distance_mm: u32 },
}

impl CalibrationRequest {
    /// Target distance used when none is given
    pub const DEFAULT_OFFSET_DISTANCE_MM: u32 = 100;
    /// Target distance used when none is given
    pub const DEFAULT_CROSSTALK_DISTANCE_MM: u32 = 500;
}

/// Result of a calibration routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationResult {
    Spads(SpadInfo),
    Reference(RefCalibration),
    /// Offset in micrometres
    Offset(i32),
    /// Compensation rate, MCPS in 16.16 fixed point
    Crosstalk(u32),
}

impl std::fmt::Display for CalibrationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationResult::Spads(info) => write!(
                f,
                "spad_count={} is_aperture={}",
                info.spad_count, info.is_aperture
            ),
            CalibrationResult::Reference(cal) => write!(
                f,
                "vhv_settings={} phase_cal={}",
                cal.vhv_settings, cal.phase_cal
            ),
            CalibrationResult::Offset(um) => write!(f, "offset={}um", um),
            CalibrationResult::Crosstalk(rate) => {
                write!(f, "xtalk_rate={:.4}MCPS", *rate as f64 / 65536.0)
            }
        }
    }
}
