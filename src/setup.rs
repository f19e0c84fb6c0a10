// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mapping from `rangelink.toml` settings onto runtime types

use std::time::Duration;

use rangelink_acquisition::AddressSpace;
use rangelink_config::{BusConfig, LoggingConfig, RangelinkConfig, ReceiverConfig};
use rangelink_hal::RangingProfile;
use rangelink_observability::DebugFlags;
use rangelink_serialization::CardinalityPolicy;
use rangelink_smoothing::FilterConfig;

use crate::error::{SessionError, SessionResult};

/// Smoothing parameters from the `[filter]` section
pub fn filter_config_from(config: &rangelink_config::FilterConfig) -> FilterConfig {
    FilterConfig {
        sleep_enable: config.sleep_enable,
        activity_threshold: config.activity_threshold,
        resolution: config.resolution,
        snap_multiplier: config.snap_multiplier,
        snap_enable: config.snap_enable,
    }
}

/// Addresses to probe, from the `[bus]` section
pub fn address_space_from(bus: &BusConfig) -> AddressSpace {
    if bus.multiplexed {
        AddressSpace::multiplexed(bus.multiplexer_address, bus.sensor_address, bus.channel_count)
    } else {
        AddressSpace::direct(bus.sensor_address)
    }
}

pub fn profile_from(bus: &BusConfig) -> SessionResult<RangingProfile> {
    Ok(bus.profile.parse::<RangingProfile>()?)
}

pub fn cardinality_policy_from(receiver: &ReceiverConfig) -> SessionResult<CardinalityPolicy> {
    receiver
        .cardinality_policy
        .parse()
        .map_err(SessionError::InvalidSetting)
}

/// Cadence floor from `[sampling]`
pub fn min_cycle_from(config: &RangelinkConfig) -> Duration {
    Duration::from_millis(config.sampling.min_cycle_ms)
}

/// Receiver read timeout; `0` means block
pub fn read_timeout_from(receiver: &ReceiverConfig) -> Option<Duration> {
    match receiver.read_timeout_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

/// Keeps file logging alive; hold it until the program exits
pub struct LogGuard {
    #[cfg(feature = "file-logging")]
    _file: Option<rangelink_observability::LoggingGuard>,
}

/// Install logging for a tool
///
/// Console output always; JSON run logs as well when `[logging]` asks for
/// them and the `file-logging` feature is compiled in.
pub fn init_logging(flags: &DebugFlags, logging: &LoggingConfig) -> anyhow::Result<LogGuard> {
    #[cfg(feature = "file-logging")]
    {
        if logging.file_logging {
            let guard = rangelink_observability::init_file_logging(
                flags,
                &logging.level,
                &logging.log_dir,
                logging.retention_runs,
            )?;
            tracing::info!("Writing logs to {}", guard.run_dir().display());
            return Ok(LogGuard { _file: Some(guard) });
        }
        rangelink_observability::init_console_logging(flags, &logging.level)?;
        Ok(LogGuard { _file: None })
    }

    #[cfg(not(feature = "file-logging"))]
    {
        rangelink_observability::init_console_logging(flags, &logging.level)?;
        if logging.file_logging {
            tracing::warn!("file_logging is set but this build lacks the file-logging feature");
        }
        Ok(LogGuard {})
    }
}

#[cfg(feature = "simulated")]
pub use simulated::simulated_bus_from_config;

#[cfg(feature = "simulated")]
mod simulated {
    use rangelink_config::RangelinkConfig;
    use rangelink_hal::{DeviceAddress, SimulatedBus, SimulatedSensorSpec};

    /// Build the simulated platform described by `[bus]` and `[simulation]`
    ///
    /// Every present channel gets a sensor at the configured sensor address.
    /// In direct mode only the first present channel is used.
    pub fn simulated_bus_from_config(config: &RangelinkConfig) -> SimulatedBus {
        let bus = &config.bus;
        let sim = &config.simulation;

        let spec_for = |channel: u8| {
            let distance = sim.base_distance_mm + sim.distance_step_mm * u32::from(channel);
            let spec = SimulatedSensorSpec::at(distance.min(i32::MAX as u32) as i32)
                .with_noise(sim.noise_mm.min(i32::MAX as u32) as i32)
                .with_timing_budget(sim.timing_budget_us);
            if sim.faulty_channels.contains(&channel) {
                spec.faulty()
            } else {
                spec
            }
        };

        if !bus.multiplexed {
            let mut simulated = SimulatedBus::direct(sim.seed);
            if let Some(&channel) = sim.present_channels.first() {
                simulated = simulated
                    .with_sensor_at(DeviceAddress::direct(bus.sensor_address), spec_for(channel));
            }
            return simulated;
        }

        sim.present_channels
            .iter()
            .fold(SimulatedBus::multiplexed(bus.multiplexer_address, sim.seed), |simulated, &ch| {
                simulated.with_sensor_at(
                    DeviceAddress::multiplexed(bus.multiplexer_address, ch, bus.sensor_address),
                    spec_for(ch),
                )
            })
    }
}
