// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink
//!
//! Streams distances from a set of time-of-flight sensors, usually sitting
//! behind a TCA9548A I2C multiplexer, as space-delimited text datagrams,
//! and decodes that stream on the receiving side.
//!
//! The umbrella crate re-exports every workspace member and adds the glue
//! the binaries share: config mapping ([`setup`]), the streaming loop
//! ([`session`]), the receiving loop ([`receiver`]) and the calibration
//! sequence ([`calibration`]).
//!
//! ## Feature Flags
//!
//! - **`simulated`** (default): in-memory sensor platform used by the tools
//!   and tests
//! - **`file-logging`**: JSON log files per run
//!
//! ## Example
//!
//! ```rust,no_run
//! use rangelink::acquisition::{discover, AddressSpace, LifecycleController};
//! use rangelink::hal::{SimulatedBus, SimulatedSensorSpec};
//! use rangelink::session::{SessionOptions, StreamSession};
//! use rangelink::transports::{Transport, UdpSender};
//!
//! let mut bus = SimulatedBus::multiplexed(0x70, 7)
//!     .with_sensor(0, SimulatedSensorSpec::at(250))
//!     .with_sensor(3, SimulatedSensorSpec::at(410));
//! let report = discover(&mut bus, &AddressSpace::default());
//! let controller = LifecycleController::new(bus, report.devices)?;
//!
//! let mut sender = UdpSender::with_address("127.0.0.1:5005")?;
//! sender.start()?;
//!
//! let session = StreamSession::new(controller, sender, SessionOptions::default())?;
//! let summary = session.run()?;
//! println!("{} cycles", summary.cycles);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use rangelink_acquisition as acquisition;
pub use rangelink_config as config;
pub use rangelink_hal as hal;
pub use rangelink_observability as observability;
pub use rangelink_serialization as serialization;
pub use rangelink_smoothing as smoothing;
pub use rangelink_transports as transports;

pub mod calibration;
pub mod receiver;
pub mod session;
pub mod setup;

mod error;

pub use error::{SessionError, SessionResult};

/// Prelude with the types most programs touch
pub mod prelude {
    pub use crate::acquisition::{discover, AddressSpace, LifecycleController, Sample};
    pub use crate::calibration::{run_calibration, CalibrationPlan, CalibrationSummary};
    pub use crate::hal::{RangingProfile, SensorBus};
    pub use crate::receiver::{ReceiverEvent, ReceiverSession};
    pub use crate::serialization::{CardinalityPolicy, FrameEncoder, PlotWindow, StreamDecoder};
    pub use crate::session::{SessionOptions, SessionSummary, StreamSession};
    pub use crate::smoothing::FilterConfig;
    pub use crate::transports::{DatagramReceiver, DatagramSender, Transport};
    pub use crate::{SessionError, SessionResult};
}
