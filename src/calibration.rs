// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Calibration sequence for one device
//!
//! SPAD management, then reference calibration, then the optional offset
//! and crosstalk steps at distances supplied by the operator. A failing
//! step is recorded and the sequence carries on.

use rangelink_acquisition::{AcquisitionError, AcquisitionResult, DeviceState, LifecycleController};
use rangelink_hal::{CalibrationRequest, CalibrationResult, RefCalibration, SensorBus, SpadInfo};
use tracing::warn;

/// Which optional steps to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationPlan {
    /// Target distance for offset calibration
    pub offset_distance_mm: Option<u32>,
    /// Target distance for crosstalk calibration
    pub crosstalk_distance_mm: Option<u32>,
}

/// Results of a calibration sequence
#[derive(Debug, Default)]
pub struct CalibrationSummary {
    pub spads: Option<SpadInfo>,
    pub reference: Option<RefCalibration>,
    /// Offset correction in micrometres
    pub offset_um: Option<i32>,
    /// Crosstalk compensation (16.16 fixed point)
    pub crosstalk: Option<u32>,
    pub failures: Vec<AcquisitionError>,
}

impl CalibrationSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the sequence on `index`
///
/// # Errors
///
/// `UnknownDevice` or `InvalidState` when the device is missing or not
/// ranging. Failures of individual steps land in the summary.
pub fn run_calibration<B: SensorBus>(
    controller: &mut LifecycleController<B>,
    index: usize,
    plan: &CalibrationPlan,
) -> AcquisitionResult<CalibrationSummary> {
    let state = controller
        .device(index)
        .map(|device| device.state())
        .ok_or(AcquisitionError::UnknownDevice(index))?;
    if state != DeviceState::Ranging {
        return Err(AcquisitionError::InvalidState {
            index,
            expected: DeviceState::Ranging,
            actual: state,
        });
    }

    let mut steps = vec![CalibrationRequest::SpadManagement, CalibrationRequest::Reference];
    if let Some(distance_mm) = plan.offset_distance_mm {
        steps.push(CalibrationRequest::Offset { distance_mm });
    }
    if let Some(distance_mm) = plan.crosstalk_distance_mm {
        steps.push(CalibrationRequest::Crosstalk { distance_mm });
    }

    let mut summary = CalibrationSummary::default();
    for request in steps {
        match controller.calibrate(index, request) {
            Ok(CalibrationResult::Spads(info)) => summary.spads = Some(info),
            Ok(CalibrationResult::Reference(reference)) => summary.reference = Some(reference),
            Ok(CalibrationResult::Offset(offset)) => summary.offset_um = Some(offset),
            Ok(CalibrationResult::Crosstalk(value)) => summary.crosstalk = Some(value),
            Err(e) => {
                warn!("Calibration step {:?} failed: {}", request, e);
                summary.failures.push(e);
            }
        }
    }
    Ok(summary)
}
