// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Device lifecycle controller
//!
//! Owns the bus and every discovered device. Per device:
//!
//! ```text
//! Idle --start--> Ranging --stop--> Idle
//!                    |  ^
//!          calibrate |  | (success or failure)
//!                    v  |
//!                Calibrating
//! ```
//!
//! Failures are isolated per device: one sensor failing to start, stop or
//! read never stops the others.

use std::time::Duration;

use rangelink_hal::{
    CalibrationRequest, CalibrationResult, HalResult, RangingProfile, RangingSensor, SensorBus,
};
use tracing::{debug, info, warn};

use crate::device::{Device, DeviceState};
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::sample::{Sample, SampleFault};

/// Shortest allowed delay between sampling cycles
pub const MIN_CYCLE: Duration = Duration::from_millis(20);

/// Outcome of [`LifecycleController::start`]
#[derive(Debug, Default)]
pub struct StartReport {
    /// Indices now ranging
    pub started: Vec<usize>,
    /// `StartFailed` per device that did not start
    pub failures: Vec<AcquisitionError>,
}

impl StartReport {
    pub fn all_started(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`LifecycleController::stop`]
#[derive(Debug, Default)]
pub struct StopReport {
    pub stopped: Vec<usize>,
    /// `StopFailed` per device that did not stop
    pub failures: Vec<AcquisitionError>,
}

impl StopReport {
    pub fn all_stopped(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives every device through start, sampling, calibration and stop
pub struct LifecycleController<B: SensorBus> {
    bus: B,
    devices: Vec<Device<B::Sensor>>,
    profile: Option<RangingProfile>,
    cadence: Option<Duration>,
    min_cycle: Duration,
    released: bool,
}

impl<B: SensorBus> LifecycleController<B> {
    /// Take ownership of the bus and the discovered devices
    ///
    /// # Errors
    ///
    /// `NoDevices` if discovery found nothing.
    pub fn new(bus: B, devices: Vec<Device<B::Sensor>>) -> AcquisitionResult<Self> {
        if devices.is_empty() {
            return Err(AcquisitionError::NoDevices);
        }
        Ok(Self {
            bus,
            devices,
            profile: None,
            cadence: None,
            min_cycle: MIN_CYCLE,
            released: false,
        })
    }

    /// Raise the cadence floor (never below 20 ms)
    pub fn with_min_cycle(mut self, min_cycle: Duration) -> Self {
        self.min_cycle = min_cycle.max(MIN_CYCLE);
        self
    }

    pub fn devices(&self) -> &[Device<B::Sensor>] {
        &self.devices
    }

    pub fn device(&self, index: usize) -> Option<&Device<B::Sensor>> {
        self.devices.get(index)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn profile(&self) -> Option<RangingProfile> {
        self.profile
    }

    pub fn platform_name(&self) -> &'static str {
        self.bus.platform_name()
    }

    /// Delay between sampling cycles
    ///
    /// Taken from the first device that started successfully, floored at
    /// the minimum cycle, and fixed from then on. Before any device has
    /// started this is the floor.
    pub fn cadence(&self) -> Duration {
        self.cadence.unwrap_or(self.min_cycle)
    }

    pub fn is_any_ranging(&self) -> bool {
        self.devices.iter().any(|d| d.state() != DeviceState::Idle)
    }

    /// Start ranging on every idle device, in discovery order
    pub fn start(&mut self, profile: RangingProfile) -> StartReport {
        let mut report = StartReport::default();
        self.profile = Some(profile);
        info!("▶ Starting {} device(s) with profile {}", self.devices.len(), profile);

        for device in self.devices.iter_mut() {
            if device.state() != DeviceState::Idle {
                report.started.push(device.index());
                continue;
            }

            // The sensor ranges as soon as start_ranging succeeds, whatever
            // the timing read returns
            let result = routed(&mut self.bus, device, |sensor| {
                sensor.start_ranging(profile)?;
                Ok(sensor.get_timing())
            });

            match result {
                Ok(timing) => {
                    device.set_state(DeviceState::Ranging);
                    device.set_connected(true);
                    match timing {
                        Ok(timing_us) if timing_us > 0 => device.set_timing_budget(timing_us),
                        Ok(_) => {}
                        Err(e) => warn!(
                            "  device {} timing read failed, keeping {} µs: {}",
                            device.index(),
                            device.timing_budget_us(),
                            e
                        ),
                    }
                    if self.cadence.is_none() && device.timing_budget_us() > 0 {
                        let cadence = Duration::from_micros(device.timing_budget_us() as u64)
                            .max(self.min_cycle);
                        debug!("  cadence fixed at {:?} from device {}", cadence, device.index());
                        self.cadence = Some(cadence);
                    }
                    debug!("  {} started", device);
                    report.started.push(device.index());
                }
                Err(source) => {
                    warn!("  device {} failed to start: {}", device.index(), source);
                    report.failures.push(AcquisitionError::StartFailed {
                        index: device.index(),
                        source,
                    });
                }
            }
        }

        if report.started.is_empty() {
            warn!("⚠ No device started; cycling at {:?}", self.cadence());
        }
        report
    }

    /// Read every device once
    ///
    /// Always returns one sample per device in discovery order. Anything
    /// that prevents a distance becomes a fault sample for this cycle only.
    pub fn sample_all(&mut self) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(self.devices.len());

        for device in self.devices.iter_mut() {
            if device.state() != DeviceState::Ranging {
                samples.push(Sample::Fault(SampleFault::NotRanging));
                continue;
            }
            if let Err(e) = self.bus.select(device.address()) {
                debug!("device {}: select failed: {}", device.index(), e);
                samples.push(Sample::Fault(SampleFault::BusFault));
                continue;
            }

            let connected = device.sensor.is_connected();
            if connected != device.is_connected() {
                if connected {
                    info!("device {} reconnected", device.index());
                } else {
                    warn!("device {} no longer answers", device.index());
                }
                device.set_connected(connected);
            }
            if !connected {
                samples.push(Sample::Fault(SampleFault::NotConnected));
                continue;
            }

            let sample = match device.sensor.get_distance() {
                Ok(distance_mm) => Sample::from_reading(distance_mm),
                Err(e) => {
                    debug!("device {}: read failed: {}", device.index(), e);
                    Sample::Fault(SampleFault::BusFault)
                }
            };
            samples.push(sample);
        }

        samples
    }

    /// Stop ranging on every device
    ///
    /// Every device is attempted, whatever its state. Failures are collected
    /// and the device keeps its state so a later stop can retry it.
    pub fn stop(&mut self) -> StopReport {
        let mut report = StopReport::default();
        info!("■ Stopping {} device(s)", self.devices.len());

        for device in self.devices.iter_mut() {
            match routed(&mut self.bus, device, |sensor| sensor.stop_ranging()) {
                Ok(()) => {
                    device.set_state(DeviceState::Idle);
                    debug!("  {} stopped", device);
                    report.stopped.push(device.index());
                }
                Err(source) => {
                    warn!("  device {} failed to stop: {}", device.index(), source);
                    report.failures.push(AcquisitionError::StopFailed {
                        index: device.index(),
                        source,
                    });
                }
            }
        }
        report
    }

    /// Stop every device and release the bus
    pub fn shutdown(mut self) -> StopReport {
        let report = self.stop();
        self.release_bus();
        report
    }

    /// Run a calibration routine on one ranging device
    ///
    /// The device is `Calibrating` for the duration and returns to `Ranging`
    /// whether the routine succeeds or not.
    pub fn calibrate(
        &mut self,
        index: usize,
        request: CalibrationRequest,
    ) -> AcquisitionResult<CalibrationResult> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(AcquisitionError::UnknownDevice(index))?;
        if device.state() != DeviceState::Ranging {
            return Err(AcquisitionError::InvalidState {
                index,
                expected: DeviceState::Ranging,
                actual: device.state(),
            });
        }

        info!("🔧 Calibrating device {}: {:?}", index, request);
        device.set_state(DeviceState::Calibrating);
        let result = routed(&mut self.bus, device, |sensor| run_calibration(sensor, request));
        device.set_state(DeviceState::Ranging);

        match result {
            Ok(outcome) => {
                info!("✓ Device {} calibration: {}", index, outcome);
                Ok(outcome)
            }
            Err(source) => Err(AcquisitionError::CalibrationFailed { index, source }),
        }
    }

    /// Move a device to a new I2C address
    ///
    /// The device keeps its index; only its bus address changes.
    pub fn reassign_address(&mut self, index: usize, new_address: u8) -> AcquisitionResult<()> {
        if new_address > 0x7F {
            return Err(AcquisitionError::InvalidAddress(new_address));
        }
        let device = self
            .devices
            .get_mut(index)
            .ok_or(AcquisitionError::UnknownDevice(index))?;

        routed(&mut self.bus, device, |sensor| sensor.set_device_address(new_address))
            .map_err(|source| AcquisitionError::BusFault { index, source })?;

        info!(
            "Device {} moved from 0x{:02X} to 0x{:02X}",
            index,
            device.address().sensor_address,
            new_address
        );
        device.set_sensor_address(new_address);
        Ok(())
    }

    fn release_bus(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.bus.release() {
            warn!("Failed to release bus: {}", e);
        }
    }
}

impl<B: SensorBus> Drop for LifecycleController<B> {
    fn drop(&mut self) {
        for device in self.devices.iter_mut() {
            if device.state() == DeviceState::Idle {
                continue;
            }
            match routed(&mut self.bus, device, |sensor| sensor.stop_ranging()) {
                Ok(()) => {
                    device.set_state(DeviceState::Idle);
                    debug!("device {} stopped on drop", device.index());
                }
                Err(e) => warn!("device {} could not be stopped on drop: {}", device.index(), e),
            }
        }
        self.release_bus();
    }
}

/// Select the device's address, then run `op` on its sensor
fn routed<B, T>(
    bus: &mut B,
    device: &mut Device<B::Sensor>,
    op: impl FnOnce(&mut B::Sensor) -> HalResult<T>,
) -> HalResult<T>
where
    B: SensorBus,
{
    bus.select(device.address())?;
    op(&mut device.sensor)
}

fn run_calibration<S: RangingSensor>(
    sensor: &mut S,
    request: CalibrationRequest,
) -> HalResult<CalibrationResult> {
    Ok(match request {
        CalibrationRequest::SpadManagement => {
            CalibrationResult::Spads(sensor.perform_spad_management()?)
        }
        CalibrationRequest::ReferenceSpads => CalibrationResult::Spads(sensor.reference_spads()?),
        CalibrationRequest::Reference => {
            CalibrationResult::Reference(sensor.perform_ref_calibration()?)
        }
        CalibrationRequest::Offset { distance_mm } => {
            CalibrationResult::Offset(sensor.perform_offset_calibration(distance_mm)?)
        }
        CalibrationRequest::Crosstalk { distance_mm } => {
            CalibrationResult::Crosstalk(sensor.perform_crosstalk_calibration(distance_mm)?)
        }
    })
}
