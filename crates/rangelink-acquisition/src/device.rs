// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use rangelink_hal::DeviceAddress;

/// Ranging state of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Idle,
    Ranging,
    Calibrating,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceState::Idle => "idle",
            DeviceState::Ranging => "ranging",
            DeviceState::Calibrating => "calibrating",
        })
    }
}

/// A sensor found during discovery
///
/// `index` is the device's position in every frame. It is assigned once by
/// the enumerator and never changes, even if the bus address does.
#[derive(Debug)]
pub struct Device<S> {
    index: usize,
    address: DeviceAddress,
    connected: bool,
    state: DeviceState,
    timing_budget_us: u32,
    pub(crate) sensor: S,
}

impl<S> Device<S> {
    pub(crate) fn new(index: usize, address: DeviceAddress, timing_budget_us: u32, sensor: S) -> Self {
        Self {
            index,
            address,
            connected: true,
            state: DeviceState::Idle,
            timing_budget_us,
            sensor,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Multiplexer channel (0 for a directly wired sensor)
    pub fn channel(&self) -> u8 {
        self.address.channel
    }

    /// Result of the most recent connectivity check
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn is_ranging(&self) -> bool {
        self.state == DeviceState::Ranging
    }

    /// Measurement period last read from the sensor (µs)
    pub fn timing_budget_us(&self) -> u32 {
        self.timing_budget_us
    }

    pub(crate) fn set_state(&mut self, state: DeviceState) {
        self.state = state;
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_timing_budget(&mut self, timing_budget_us: u32) {
        self.timing_budget_us = timing_budget_us;
    }

    pub(crate) fn set_sensor_address(&mut self, sensor_address: u8) {
        self.address.sensor_address = sensor_address;
    }
}

impl<S> fmt::Display for Device<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {} at {} [{}]", self.index, self.address, self.state)
    }
}
