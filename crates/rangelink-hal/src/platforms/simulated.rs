// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulated sensor platform
//!
//! Sensors live in memory behind a pretend multiplexer. The bus refuses any
//! sensor operation whose channel is not currently selected, so code running
//! against it has to address devices the same way it would on real hardware.
//! A [`SimulatedBusMonitor`] keeps a view of the bus after it has been moved
//! into a controller, for fault injection and for checking start/stop pairs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::hal::{
    DeviceAddress, RangingProfile, RangingSensor, RefCalibration, SensorBus, SpadInfo,
    DEFAULT_SENSOR_ADDRESS, MAX_CHANNELS,
};
use crate::{HalError, HalResult};

/// Added to the timing budget to give the inter-measurement period
const INTER_MEASUREMENT_OVERHEAD_US: u32 = 1000;

/// Vendor status codes used by the simulation
const STATUS_INVALID_PARAMS: i32 = -4;
const STATUS_RANGE_ERROR: i32 = -6;
const STATUS_CONTROL_INTERFACE: i32 = -20;

/// Behaviour of one simulated sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSensorSpec {
    /// Nominal distance reported
    pub distance_mm: i32,
    /// Uniform noise amplitude added to each reading
    pub noise_mm: i32,
    /// Readings to cycle through instead of `distance_mm`
    pub script: Vec<i32>,
    pub timing_budget_us: u32,
    /// Every distance read fails with a bus error
    pub fault_reads: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Timing reads fail while the sensor is ranging
    pub fail_timing: bool,
    pub connected: bool,
}

impl Default for SimulatedSensorSpec {
    fn default() -> Self {
        Self {
            distance_mm: 300,
            noise_mm: 0,
            script: Vec::new(),
            timing_budget_us: 33_000,
            fault_reads: false,
            fail_start: false,
            fail_stop: false,
            fail_timing: false,
            connected: true,
        }
    }
}

impl SimulatedSensorSpec {
    /// Sensor reporting a constant distance
    pub fn at(distance_mm: i32) -> Self {
        Self {
            distance_mm,
            ..Default::default()
        }
    }

    pub fn with_noise(mut self, noise_mm: i32) -> Self {
        self.noise_mm = noise_mm;
        self
    }

    pub fn with_script(mut self, script: Vec<i32>) -> Self {
        self.script = script;
        self
    }

    pub fn with_timing_budget(mut self, timing_budget_us: u32) -> Self {
        self.timing_budget_us = timing_budget_us;
        self
    }

    /// Every read fails
    pub fn faulty(mut self) -> Self {
        self.fault_reads = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

/// Something that happened on the simulated bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Selected {
        channel: u8,
    },
    RangingStarted {
        channel: u8,
        sensor_address: u8,
        profile: RangingProfile,
    },
    RangingStopped {
        channel: u8,
        sensor_address: u8,
    },
    AddressChanged {
        channel: u8,
        from: u8,
        to: u8,
    },
    Released,
}

/// (channel, sensor address)
type SlotKey = (u8, u8);

#[derive(Debug)]
struct Slot {
    spec: SimulatedSensorSpec,
    ranging: bool,
    reads: usize,
}

impl Slot {
    fn timing(&self) -> u32 {
        if self.spec.connected {
            self.spec.timing_budget_us + INTER_MEASUREMENT_OVERHEAD_US
        } else {
            0
        }
    }
}

#[derive(Debug)]
struct BusState {
    mux_address: Option<u8>,
    slots: BTreeMap<SlotKey, Slot>,
    selected: Option<u8>,
    events: Vec<BusEvent>,
    rng: StdRng,
}

/// In-memory bus populated with simulated sensors
pub struct SimulatedBus {
    state: Rc<RefCell<BusState>>,
}

impl SimulatedBus {
    /// Bus with a multiplexer at `mux_address`
    pub fn multiplexed(mux_address: u8, seed: u64) -> Self {
        Self::with_mux(Some(mux_address), seed)
    }

    /// Bus with sensors wired straight to it
    pub fn direct(seed: u64) -> Self {
        Self::with_mux(None, seed)
    }

    fn with_mux(mux_address: Option<u8>, seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                mux_address,
                slots: BTreeMap::new(),
                selected: None,
                events: Vec::new(),
                rng: StdRng::seed_from_u64(seed),
            })),
        }
    }

    /// Place a sensor at the factory address on `channel`
    pub fn with_sensor(self, channel: u8, spec: SimulatedSensorSpec) -> Self {
        self.insert((channel, DEFAULT_SENSOR_ADDRESS), spec);
        self
    }

    /// Place a sensor at an explicit address
    pub fn with_sensor_at(self, address: DeviceAddress, spec: SimulatedSensorSpec) -> Self {
        self.insert((address.channel, address.sensor_address), spec);
        self
    }

    fn insert(&self, key: SlotKey, spec: SimulatedSensorSpec) {
        self.state.borrow_mut().slots.insert(
            key,
            Slot {
                spec,
                ranging: false,
                reads: 0,
            },
        );
    }

    /// Observer sharing this bus's state
    pub fn monitor(&self) -> SimulatedBusMonitor {
        SimulatedBusMonitor {
            state: Rc::clone(&self.state),
        }
    }
}

impl SensorBus for SimulatedBus {
    type Sensor = SimulatedSensor;

    fn platform_name(&self) -> &'static str {
        "simulated"
    }

    fn select(&mut self, address: &DeviceAddress) -> HalResult<()> {
        let mut state = self.state.borrow_mut();
        match (address.mux_address, state.mux_address) {
            (None, _) => Ok(()),
            (Some(requested), Some(present)) if requested == present => {
                if address.channel >= MAX_CHANNELS {
                    return Err(HalError::InvalidChannel {
                        channel: address.channel,
                        max: MAX_CHANNELS - 1,
                    });
                }
                state.selected = Some(address.channel);
                state.events.push(BusEvent::Selected {
                    channel: address.channel,
                });
                Ok(())
            }
            (Some(requested), _) => Err(HalError::bus(format!(
                "no multiplexer answered at 0x{:02X}",
                requested
            ))),
        }
    }

    fn attach(&mut self, address: &DeviceAddress) -> HalResult<SimulatedSensor> {
        Ok(SimulatedSensor {
            state: Rc::clone(&self.state),
            key: (address.channel, address.sensor_address),
            multiplexed: address.is_multiplexed(),
        })
    }

    fn release(&mut self) -> HalResult<()> {
        let mut state = self.state.borrow_mut();
        state.selected = None;
        state.events.push(BusEvent::Released);
        Ok(())
    }
}

/// Driver handle for one simulated sensor
///
/// Handles may point at an empty position; such a sensor reports a timing
/// of 0 and never produces a distance.
pub struct SimulatedSensor {
    state: Rc<RefCell<BusState>>,
    key: SlotKey,
    multiplexed: bool,
}

impl SimulatedSensor {
    pub fn channel(&self) -> u8 {
        self.key.0
    }

    pub fn sensor_address(&self) -> u8 {
        self.key.1
    }

    fn check_routed(&self, state: &BusState) -> HalResult<()> {
        if self.multiplexed && state.selected != Some(self.key.0) {
            return Err(HalError::bus(format!(
                "channel {} is not selected (selected: {:?})",
                self.key.0, state.selected
            )));
        }
        Ok(())
    }

    /// Run `op` against the routed slot, which must hold a ranging sensor
    fn calibrate<T>(&mut self, op: impl FnOnce(&Slot) -> HalResult<T>) -> HalResult<T> {
        let state = self.state.borrow();
        self.check_routed(&state)?;
        let slot = state
            .slots
            .get(&self.key)
            .ok_or_else(|| HalError::bus(format!("no acknowledge from {:?}", self.key)))?;
        if !slot.ranging {
            return Err(HalError::NotRanging);
        }
        op(slot)
    }
}

impl RangingSensor for SimulatedSensor {
    fn start_ranging(&mut self, profile: RangingProfile) -> HalResult<()> {
        let mut state = self.state.borrow_mut();
        self.check_routed(&state)?;
        let (channel, sensor_address) = self.key;

        if let Some(slot) = state.slots.get_mut(&self.key) {
            if slot.spec.fail_start {
                return Err(HalError::Status {
                    operation: "start_ranging",
                    code: STATUS_RANGE_ERROR,
                });
            }
            slot.ranging = true;
        }
        trace!("[SIM] start ranging ch{} 0x{:02X} {}", channel, sensor_address, profile);
        state.events.push(BusEvent::RangingStarted {
            channel,
            sensor_address,
            profile,
        });
        Ok(())
    }

    fn stop_ranging(&mut self) -> HalResult<()> {
        let mut state = self.state.borrow_mut();
        self.check_routed(&state)?;
        let (channel, sensor_address) = self.key;

        if let Some(slot) = state.slots.get_mut(&self.key) {
            if slot.spec.fail_stop {
                return Err(HalError::Status {
                    operation: "stop_ranging",
                    code: STATUS_CONTROL_INTERFACE,
                });
            }
            slot.ranging = false;
        }
        trace!("[SIM] stop ranging ch{} 0x{:02X}", channel, sensor_address);
        state.events.push(BusEvent::RangingStopped {
            channel,
            sensor_address,
        });
        Ok(())
    }

    fn get_distance(&mut self) -> HalResult<i32> {
        let mut guard = self.state.borrow_mut();
        self.check_routed(&guard)?;
        let BusState { slots, rng, .. } = &mut *guard;

        let slot = slots
            .get_mut(&self.key)
            .ok_or_else(|| HalError::bus(format!("no acknowledge from {:?}", self.key)))?;
        if !slot.ranging {
            return Err(HalError::NotRanging);
        }
        if slot.spec.fault_reads || !slot.spec.connected {
            return Err(HalError::bus(format!("read timeout on channel {}", self.key.0)));
        }

        let base = if slot.spec.script.is_empty() {
            slot.spec.distance_mm
        } else {
            slot.spec.script[slot.reads % slot.spec.script.len()]
        };
        slot.reads += 1;

        let noise = if slot.spec.noise_mm > 0 {
            rng.gen_range(-slot.spec.noise_mm..=slot.spec.noise_mm)
        } else {
            0
        };
        Ok(base + noise)
    }

    fn get_timing(&mut self) -> HalResult<u32> {
        let state = self.state.borrow();
        self.check_routed(&state)?;
        match state.slots.get(&self.key) {
            Some(slot) if slot.spec.fail_timing && slot.ranging => Err(HalError::Status {
                operation: "get_timing",
                code: STATUS_CONTROL_INTERFACE,
            }),
            slot => Ok(slot.map(Slot::timing).unwrap_or(0)),
        }
    }

    fn is_connected(&mut self) -> bool {
        let state = self.state.borrow();
        self.check_routed(&state).is_ok()
            && state
                .slots
                .get(&self.key)
                .is_some_and(|slot| slot.spec.connected)
    }

    fn perform_spad_management(&mut self) -> HalResult<SpadInfo> {
        self.calibrate(|_| {
            Ok(SpadInfo {
                spad_count: 12,
                is_aperture: false,
            })
        })
    }

    fn reference_spads(&mut self) -> HalResult<SpadInfo> {
        self.calibrate(|_| {
            Ok(SpadInfo {
                spad_count: 12,
                is_aperture: false,
            })
        })
    }

    fn perform_ref_calibration(&mut self) -> HalResult<RefCalibration> {
        self.calibrate(|_| {
            Ok(RefCalibration {
                vhv_settings: 32,
                phase_cal: 1,
            })
        })
    }

    fn perform_offset_calibration(&mut self, distance_mm: u32) -> HalResult<i32> {
        self.calibrate(|slot| {
            if distance_mm == 0 {
                return Err(HalError::Status {
                    operation: "perform_offset_calibration",
                    code: STATUS_INVALID_PARAMS,
                });
            }
            Ok((distance_mm as i32 - slot.spec.distance_mm) * 1000)
        })
    }

    fn perform_crosstalk_calibration(&mut self, distance_mm: u32) -> HalResult<u32> {
        self.calibrate(|_| {
            if distance_mm == 0 {
                return Err(HalError::Status {
                    operation: "perform_crosstalk_calibration",
                    code: STATUS_INVALID_PARAMS,
                });
            }
            // 0.1 MCPS in 16.16
            Ok(6554)
        })
    }

    fn set_device_address(&mut self, address: u8) -> HalResult<()> {
        let mut state = self.state.borrow_mut();
        self.check_routed(&state)?;
        let (channel, from) = self.key;
        let new_key = (channel, address);

        if address > 0x7F || (new_key != self.key && state.slots.contains_key(&new_key)) {
            return Err(HalError::Status {
                operation: "set_device_address",
                code: STATUS_INVALID_PARAMS,
            });
        }
        let slot = state
            .slots
            .remove(&self.key)
            .ok_or_else(|| HalError::bus(format!("no acknowledge from {:?}", self.key)))?;
        state.slots.insert(new_key, slot);
        state.events.push(BusEvent::AddressChanged {
            channel,
            from,
            to: address,
        });
        self.key = new_key;
        Ok(())
    }
}

/// Read-only view of a simulated bus, plus fault injection
#[derive(Clone)]
pub struct SimulatedBusMonitor {
    state: Rc<RefCell<BusState>>,
}

impl SimulatedBusMonitor {
    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    pub fn selected(&self) -> Option<u8> {
        self.state.borrow().selected
    }

    /// Whether any sensor on `channel` is ranging
    pub fn is_ranging(&self, channel: u8) -> bool {
        self.state
            .borrow()
            .slots
            .iter()
            .any(|((ch, _), slot)| *ch == channel && slot.ranging)
    }

    /// Channels with a ranging sensor, ascending
    pub fn ranging_channels(&self) -> Vec<u8> {
        let state = self.state.borrow();
        let mut channels: Vec<u8> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.ranging)
            .map(|((ch, _), _)| *ch)
            .collect();
        channels.dedup();
        channels
    }

    pub fn start_count(&self, channel: u8) -> usize {
        self.count(|e| matches!(e, BusEvent::RangingStarted { channel: c, .. } if *c == channel))
    }

    pub fn stop_count(&self, channel: u8) -> usize {
        self.count(|e| matches!(e, BusEvent::RangingStopped { channel: c, .. } if *c == channel))
    }

    fn count(&self, pred: impl Fn(&BusEvent) -> bool) -> usize {
        self.state.borrow().events.iter().filter(|&e| pred(e)).count()
    }

    /// Make reads on `channel` fail (or recover)
    pub fn set_faulty(&self, channel: u8, faulty: bool) {
        self.for_channel(channel, |slot| slot.spec.fault_reads = faulty);
    }

    /// Simulate a sensor dropping off the bus (or coming back)
    pub fn set_connected(&self, channel: u8, connected: bool) {
        self.for_channel(channel, |slot| slot.spec.connected = connected);
    }

    pub fn set_fail_start(&self, channel: u8, fail: bool) {
        self.for_channel(channel, |slot| slot.spec.fail_start = fail);
    }

    pub fn set_fail_stop(&self, channel: u8, fail: bool) {
        self.for_channel(channel, |slot| slot.spec.fail_stop = fail);
    }

    pub fn set_fail_timing(&self, channel: u8, fail: bool) {
        self.for_channel(channel, |slot| slot.spec.fail_timing = fail);
    }

    pub fn set_distance(&self, channel: u8, distance_mm: i32) {
        self.for_channel(channel, |slot| {
            slot.spec.distance_mm = distance_mm;
            slot.spec.script.clear();
        });
    }

    fn for_channel(&self, channel: u8, mut f: impl FnMut(&mut Slot)) {
        let mut state = self.state.borrow_mut();
        for ((ch, _), slot) in state.slots.iter_mut() {
            if *ch == channel {
                f(slot);
            }
        }
    }
}
