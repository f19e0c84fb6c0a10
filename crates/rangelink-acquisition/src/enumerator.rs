// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bus enumeration
//!
//! Walks the multiplexer channels in ascending order and probes each one.
//! A probe starts ranging, reads the timing budget back and stops ranging
//! again. A budget of 0 means nothing answered. Every probe is returned to
//! the caller as a [`ProbeRecord`] so the start/stop toggling is visible.

use rangelink_hal::{
    DeviceAddress, HalError, HalResult, RangingProfile, RangingSensor, SensorBus,
    DEFAULT_MULTIPLEXER_ADDRESS, DEFAULT_SENSOR_ADDRESS, MAX_CHANNELS,
};
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::AcquisitionError;

/// Profile used while probing (shortest budget)
pub const PROBE_PROFILE: RangingProfile = RangingProfile::GoodAccuracy;

/// Where to look for sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    /// Identical sensors behind a TCA9548A, one per channel
    Multiplexed {
        mux_address: u8,
        sensor_address: u8,
        channel_count: u8,
    },
    /// A single sensor wired straight to the bus
    Direct { sensor_address: u8 },
}

impl Default for AddressSpace {
    fn default() -> Self {
        AddressSpace::Multiplexed {
            mux_address: DEFAULT_MULTIPLEXER_ADDRESS,
            sensor_address: DEFAULT_SENSOR_ADDRESS,
            channel_count: MAX_CHANNELS,
        }
    }
}

impl AddressSpace {
    pub fn multiplexed(mux_address: u8, sensor_address: u8, channel_count: u8) -> Self {
        AddressSpace::Multiplexed {
            mux_address,
            sensor_address,
            channel_count: channel_count.min(MAX_CHANNELS),
        }
    }

    pub fn direct(sensor_address: u8) -> Self {
        AddressSpace::Direct { sensor_address }
    }

    /// Candidate addresses in probe order
    pub fn addresses(&self) -> Vec<DeviceAddress> {
        match *self {
            AddressSpace::Multiplexed {
                mux_address,
                sensor_address,
                channel_count,
            } => (0..channel_count.min(MAX_CHANNELS))
                .map(|channel| DeviceAddress::multiplexed(mux_address, channel, sensor_address))
                .collect(),
            AddressSpace::Direct { sensor_address } => vec![DeviceAddress::direct(sensor_address)],
        }
    }
}

/// What a probe concluded
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Present,
    Inconclusive { reason: String },
}

/// Everything one probe did on the bus
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub address: DeviceAddress,
    /// start_ranging was accepted
    pub ranging_started: bool,
    /// stop_ranging was issued and accepted
    pub ranging_stopped: bool,
    /// Timing read back (0 if unavailable)
    pub timing_budget_us: u32,
    pub outcome: ProbeOutcome,
}

impl ProbeRecord {
    pub fn channel(&self) -> u8 {
        self.address.channel
    }

    pub fn is_present(&self) -> bool {
        self.outcome == ProbeOutcome::Present
    }

    /// The probe as an error, if nothing was found
    pub fn error(&self) -> Option<AcquisitionError> {
        match &self.outcome {
            ProbeOutcome::Present => None,
            ProbeOutcome::Inconclusive { reason } => Some(AcquisitionError::ProbeInconclusive {
                channel: self.address.channel,
                reason: reason.clone(),
            }),
        }
    }
}

/// Result of [`discover`]
#[derive(Debug)]
pub struct DiscoveryReport<S> {
    /// Present devices in channel order, indexed from 0
    pub devices: Vec<Device<S>>,
    /// One record per probed address, in probe order
    pub probes: Vec<ProbeRecord>,
}

impl<S> DiscoveryReport<S> {
    pub fn channels(&self) -> Vec<u8> {
        self.devices.iter().map(Device::channel).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Keeps ranging scoped to a probe
///
/// `finish` stops ranging and reports the result. If the guard is dropped
/// without `finish` (early return, panic) ranging is stopped anyway.
struct RangingGuard<'a, S: RangingSensor> {
    sensor: &'a mut S,
    finished: bool,
}

impl<'a, S: RangingSensor> RangingGuard<'a, S> {
    /// Issue start_ranging; the guard owns the stop from here on
    fn start(sensor: &'a mut S, profile: RangingProfile) -> (Self, HalResult<()>) {
        let started = sensor.start_ranging(profile);
        (
            Self {
                sensor,
                finished: false,
            },
            started,
        )
    }

    fn sensor(&mut self) -> &mut S {
        self.sensor
    }

    fn finish(mut self) -> HalResult<()> {
        self.finished = true;
        self.sensor.stop_ranging()
    }
}

impl<S: RangingSensor> Drop for RangingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.sensor.stop_ranging();
        }
    }
}

/// Probe every address in `space` and collect the sensors that answered
///
/// Discovery never fails as a whole. Channels that cannot be selected or
/// report no timing are recorded as inconclusive and left out.
pub fn discover<B: SensorBus>(bus: &mut B, space: &AddressSpace) -> DiscoveryReport<B::Sensor> {
    let mut devices = Vec::new();
    let mut probes = Vec::new();

    info!(
        "🔍 Probing {} address(es) on {} bus",
        space.addresses().len(),
        bus.platform_name()
    );

    for address in space.addresses() {
        let (record, sensor) = probe(bus, address);

        match (&record.outcome, sensor) {
            (ProbeOutcome::Present, Some(sensor)) => {
                let index = devices.len();
                debug!(
                    "  {}: present (timing {} us) -> device {}",
                    address, record.timing_budget_us, index
                );
                devices.push(Device::new(index, address, record.timing_budget_us, sensor));
            }
            (ProbeOutcome::Inconclusive { reason }, _) => {
                debug!("  {}: {}", address, reason);
            }
            (ProbeOutcome::Present, None) => {}
        }
        if record.ranging_started && !record.ranging_stopped {
            warn!("  {}: probe could not stop ranging", address);
        }
        probes.push(record);
    }

    info!(
        "✓ Found {} device(s) on channel(s) {:?}",
        devices.len(),
        devices.iter().map(Device::channel).collect::<Vec<_>>()
    );

    DiscoveryReport { devices, probes }
}

fn probe<B: SensorBus>(bus: &mut B, address: DeviceAddress) -> (ProbeRecord, Option<B::Sensor>) {
    let mut record = ProbeRecord {
        address,
        ranging_started: false,
        ranging_stopped: false,
        timing_budget_us: 0,
        outcome: ProbeOutcome::Inconclusive {
            reason: String::new(),
        },
    };

    if let Err(e) = bus.select(&address) {
        record.outcome = inconclusive("channel select failed", &e);
        return (record, None);
    }
    let mut sensor = match bus.attach(&address) {
        Ok(sensor) => sensor,
        Err(e) => {
            record.outcome = inconclusive("attach failed", &e);
            return (record, None);
        }
    };

    let (mut guard, started) = RangingGuard::start(&mut sensor, PROBE_PROFILE);
    record.ranging_started = started.is_ok();
    let timing = guard.sensor().get_timing();
    record.ranging_stopped = guard.finish().is_ok();

    record.outcome = match (started, timing) {
        (Err(e), _) => inconclusive("start_ranging failed", &e),
        (Ok(()), Err(e)) => inconclusive("timing read failed", &e),
        (Ok(()), Ok(0)) => ProbeOutcome::Inconclusive {
            reason: "no timing budget (nothing answered)".to_string(),
        },
        (Ok(()), Ok(budget)) => {
            record.timing_budget_us = budget;
            ProbeOutcome::Present
        }
    };

    let sensor = record.is_present().then_some(sensor);
    (record, sensor)
}

fn inconclusive(what: &str, error: &HalError) -> ProbeOutcome {
    ProbeOutcome::Inconclusive {
        reason: format!("{}: {}", what, error),
    }
}
