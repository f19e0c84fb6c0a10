// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Streaming session
//!
//! One thread, one loop: read every device in discovery order, encode the
//! cycle as a text frame, send it, sleep for the cadence. Clearing the
//! running flag (Ctrl-C in the binaries) ends the loop after the current
//! cycle, and every device is stopped before [`StreamSession::run`] returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rangelink_acquisition::{LifecycleController, Sample, StartReport, StopReport};
use rangelink_hal::{RangingProfile, SensorBus};
use rangelink_serialization::FrameEncoder;
use rangelink_smoothing::{FilterBank, FilterConfig};
use rangelink_transports::DatagramSender;
use tracing::{debug, info, trace, warn};

use crate::error::SessionResult;

/// How a session runs
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub profile: RangingProfile,
    /// Smooth readings before encoding them
    pub filter: Option<FilterConfig>,
    /// Announce the device count before the first data frame
    pub send_discovery_frame: bool,
    /// Stop after this many cycles (None = until the running flag clears)
    pub max_cycles: Option<u64>,
    /// Sleep for the cadence between cycles
    pub paced: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            profile: RangingProfile::default(),
            filter: None,
            send_discovery_frame: true,
            max_cycles: None,
            paced: true,
        }
    }
}

/// One sampling cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub samples: Vec<Sample>,
    /// Values that went on the wire (after smoothing, if enabled)
    pub readings: Vec<Option<u32>>,
    pub frame: String,
    pub sent: bool,
}

/// Totals for a finished session
#[derive(Debug, Default)]
pub struct SessionSummary {
    pub start: StartReport,
    pub stop: StopReport,
    pub cycles: u64,
    pub frames_sent: u64,
    pub send_failures: u64,
    /// Faulty samples per device index
    pub faults: Vec<u64>,
}

/// Streams every discovered device to one datagram sink
pub struct StreamSession<B: SensorBus, T: DatagramSender> {
    controller: LifecycleController<B>,
    sender: T,
    encoder: FrameEncoder,
    filters: Option<FilterBank>,
    options: SessionOptions,
    running: Arc<AtomicBool>,
    frame: String,
}

impl<B: SensorBus, T: DatagramSender> StreamSession<B, T> {
    /// # Errors
    ///
    /// `Frame` if the controller holds more devices than a frame can carry.
    pub fn new(
        controller: LifecycleController<B>,
        sender: T,
        options: SessionOptions,
    ) -> SessionResult<Self> {
        let encoder = FrameEncoder::new(controller.len())?;
        let filters = options
            .filter
            .map(|config| FilterBank::new(controller.len(), config));
        Ok(Self {
            controller,
            sender,
            encoder,
            filters,
            options,
            running: Arc::new(AtomicBool::new(true)),
            frame: String::new(),
        })
    }

    /// Flag that keeps the loop going; store `false` to stop
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn controller(&self) -> &LifecycleController<B> {
        &self.controller
    }

    pub fn sender(&self) -> &T {
        &self.sender
    }

    /// Read, encode and send one cycle
    ///
    /// A failed send is logged and reported in the cycle, never fatal.
    pub fn step(&mut self) -> SessionResult<CycleReport> {
        let samples = self.controller.sample_all();
        let mut readings: Vec<Option<u32>> = samples.iter().map(Sample::distance).collect();
        if let Some(filters) = self.filters.as_mut() {
            readings = filters.apply(&readings);
        }

        self.encoder.encode_into(&readings, &mut self.frame)?;
        let sent = match self.sender.send(self.frame.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Frame not sent: {}", e);
                false
            }
        };
        trace!("frame: {:?}", self.frame);

        Ok(CycleReport {
            samples,
            readings,
            frame: self.frame.clone(),
            sent,
        })
    }

    /// Start ranging, stream until stopped, then stop every device
    pub fn run(mut self) -> SessionResult<SessionSummary> {
        let mut summary = SessionSummary {
            faults: vec![0; self.controller.len()],
            ..Default::default()
        };

        summary.start = self.controller.start(self.options.profile);
        if summary.start.started.is_empty() {
            warn!("No device started ranging; every sample will be a fault");
        }
        info!(
            "🚀 Streaming {} device(s) every {:?}",
            self.controller.len(),
            self.controller.cadence()
        );

        let outcome = self.stream(&mut summary);

        let StreamSession { controller, .. } = self;
        summary.stop = controller.shutdown();
        info!(
            "✅ Session ended after {} cycle(s), {} frame(s) sent",
            summary.cycles, summary.frames_sent
        );

        outcome.map(|()| summary)
    }

    fn stream(&mut self, summary: &mut SessionSummary) -> SessionResult<()> {
        if self.options.send_discovery_frame {
            let announcement = self.encoder.discovery_frame();
            match self.sender.send(announcement.as_bytes()) {
                Ok(()) => debug!("Sent discovery frame {:?}", announcement),
                Err(e) => warn!("Discovery frame not sent: {}", e),
            }
        }

        let cadence = self.controller.cadence();
        while self.running.load(Ordering::SeqCst) {
            if self.options.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let cycle = self.step()?;
            summary.cycles += 1;
            if cycle.sent {
                summary.frames_sent += 1;
            } else {
                summary.send_failures += 1;
            }
            for (count, sample) in summary.faults.iter_mut().zip(&cycle.samples) {
                if sample.is_fault() {
                    *count += 1;
                }
            }

            if self.options.paced {
                thread::sleep(cadence);
            }
        }
        Ok(())
    }
}
