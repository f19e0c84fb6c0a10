// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::marker::PhantomData;

use embedded_hal::i2c::I2c;

use crate::hal::multiplexer::Tca9548a;
use crate::hal::ranging::RangingSensor;
use crate::HalResult;

/// Where a sensor lives on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress {
    /// Multiplexer in front of the sensor, if any
    pub mux_address: Option<u8>,
    /// Multiplexer channel (0 when wired directly)
    pub channel: u8,
    /// 7-bit I2C address of the sensor itself
    pub sensor_address: u8,
}

impl DeviceAddress {
    /// Sensor behind channel `channel` of the multiplexer at `mux_address`
    pub fn multiplexed(mux_address: u8, channel: u8, sensor_address: u8) -> Self {
        Self {
            mux_address: Some(mux_address),
            channel,
            sensor_address,
        }
    }

    /// Sensor wired straight to the bus
    pub fn direct(sensor_address: u8) -> Self {
        Self {
            mux_address: None,
            channel: 0,
            sensor_address,
        }
    }

    pub fn is_multiplexed(&self) -> bool {
        self.mux_address.is_some()
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mux_address {
            Some(mux) => write!(
                f,
                "channel {} (0x{:02X} via mux 0x{:02X})",
                self.channel, self.sensor_address, mux
            ),
            None => write!(f, "0x{:02X}", self.sensor_address),
        }
    }
}

/// Bus context that owns addressing and hands out sensor drivers
///
/// Sensors that share an address are only reachable one at a time, so every
/// operation on a sensor must be preceded by [`SensorBus::select`] for that
/// sensor's address.
pub trait SensorBus {
    /// Driver handle produced for each attached sensor
    type Sensor: RangingSensor;

    /// Platform name (e.g. "simulated", "linux-i2c")
    fn platform_name(&self) -> &'static str;

    /// Route subsequent transfers to `address`
    fn select(&mut self, address: &DeviceAddress) -> HalResult<()>;

    /// Create a driver for the sensor at `address`
    ///
    /// Attaching does not talk to the sensor. Whether anything answers is
    /// decided later by probing.
    fn attach(&mut self, address: &DeviceAddress) -> HalResult<Self::Sensor>;

    /// Disconnect all channels (called once at shutdown)
    fn release(&mut self) -> HalResult<()> {
        Ok(())
    }
}

/// Real-hardware bus: a TCA9548A plus a vendor driver factory
///
/// `factory` builds the vendor driver for one address. The driver is expected
/// to share the upstream I2C bus (for example through `embedded-hal-bus`).
pub struct MultiplexedBus<I2C, S, F> {
    mux: Tca9548a<I2C>,
    factory: F,
    name: &'static str,
    _sensor: PhantomData<fn() -> S>,
}

impl<I2C, S, F> MultiplexedBus<I2C, S, F>
where
    I2C: I2c,
    S: RangingSensor,
    F: FnMut(&DeviceAddress) -> HalResult<S>,
{
    pub fn new(mux: Tca9548a<I2C>, name: &'static str, factory: F) -> Self {
        Self {
            mux,
            factory,
            name,
            _sensor: PhantomData,
        }
    }

    pub fn multiplexer(&self) -> &Tca9548a<I2C> {
        &self.mux
    }
}

impl<I2C, S, F> SensorBus for MultiplexedBus<I2C, S, F>
where
    I2C: I2c,
    S: RangingSensor,
    F: FnMut(&DeviceAddress) -> HalResult<S>,
{
    type Sensor = S;

    fn platform_name(&self) -> &'static str {
        self.name
    }

    fn select(&mut self, address: &DeviceAddress) -> HalResult<()> {
        match address.mux_address {
            Some(_) => self.mux.select(address.channel),
            None => self.mux.disable_all(),
        }
    }

    fn attach(&mut self, address: &DeviceAddress) -> HalResult<S> {
        (self.factory)(address)
    }

    fn release(&mut self) -> HalResult<()> {
        self.mux.disable_all()
    }
}
