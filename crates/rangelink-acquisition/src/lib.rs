// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink-acquisition
//!
//! Finds ranging sensors on a bus and drives them through their lifecycle.
//!
//! ```no_run
//! use rangelink_acquisition::{discover, AddressSpace, LifecycleController};
//! use rangelink_hal::{RangingProfile, SimulatedBus, SimulatedSensorSpec};
//!
//! let mut bus = SimulatedBus::multiplexed(0x70, 42).with_sensor(0, SimulatedSensorSpec::at(250));
//! let report = discover(&mut bus, &AddressSpace::default());
//! let mut controller = LifecycleController::new(bus, report.devices)?;
//! controller.start(RangingProfile::BetterAccuracy);
//! let samples = controller.sample_all();
//! assert_eq!(samples.len(), 1);
//! controller.shutdown();
//! # Ok::<(), rangelink_acquisition::AcquisitionError>(())
//! ```

pub mod device;
pub mod enumerator;
pub mod error;
pub mod lifecycle;
pub mod sample;

pub use device::{Device, DeviceState};
pub use enumerator::{
    discover, AddressSpace, DiscoveryReport, ProbeOutcome, ProbeRecord, PROBE_PROFILE,
};
pub use error::{AcquisitionError, AcquisitionResult};
pub use lifecycle::{LifecycleController, StartReport, StopReport, MIN_CYCLE};
pub use sample::{Sample, SampleFault};
