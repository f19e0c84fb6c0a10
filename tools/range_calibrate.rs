// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Range Calibration Tool

Calibrates the sensor on one multiplexer channel: SPAD management, reference
calibration, then offset and crosstalk calibration when target distances are
given.

Usage:
  cargo run --bin range_calibrate -- [debug|info] --channel N [--offset-mm N] [--xtalk-mm N]

Example:
  cargo run --bin range_calibrate -- info --channel 2 --offset-mm 100
*/

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use rangelink::acquisition::{discover, LifecycleController};
use rangelink::calibration::{run_calibration, CalibrationPlan};
use rangelink::config::{load_config, validate_config};
use rangelink::observability::DebugFlags;
use rangelink::observability::Verbosity;
use rangelink::setup::{address_space_from, init_logging, profile_from, simulated_bus_from_config};

/// Calibrate one time-of-flight sensor
#[derive(Parser, Debug)]
#[command(name = "range_calibrate", version, about, long_about = None)]
struct Args {
    /// `info` or `debug`
    verbosity: Option<Verbosity>,

    /// Multiplexer channel of the sensor to calibrate
    #[arg(long)]
    channel: u8,

    /// Distance to a target for offset calibration, in millimetres
    #[arg(long)]
    offset_mm: Option<u32>,

    /// Distance to a target for crosstalk calibration, in millimetres
    #[arg(long)]
    xtalk_mm: Option<u32>,

    /// Path to rangelink.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let (debug_args, cli_args): (Vec<String>, Vec<String>) =
        env::args().partition(|arg| arg.starts_with("--debug-"));
    let args = Args::parse_from(cli_args);
    let mut flags = DebugFlags::from_args(debug_args).with_env();
    flags.verbosity = args.verbosity.unwrap_or_default();

    let config = load_config(args.config.as_deref(), None).context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;
    let _log_guard = init_logging(&flags, &config.logging)?;

    println!("🔧 rangelink calibration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut bus = simulated_bus_from_config(&config);
    let report = discover(&mut bus, &address_space_from(&config.bus));
    let devices: Vec<_> = report
        .devices
        .into_iter()
        .filter(|device| device.channel() == args.channel)
        .collect();
    if devices.is_empty() {
        bail!("No sensor found on channel {}", args.channel);
    }

    let mut controller = LifecycleController::new(bus, devices)?;
    let start = controller.start(profile_from(&config.bus)?);
    if let Some(failure) = start.failures.first() {
        bail!("Sensor did not start: {}", failure);
    }

    let plan = CalibrationPlan {
        offset_distance_mm: args.offset_mm,
        crosstalk_distance_mm: args.xtalk_mm,
    };
    let summary = run_calibration(&mut controller, 0, &plan)?;
    let stop = controller.shutdown();

    if let Some(spads) = summary.spads {
        println!("   SPADs:     {} (aperture: {})", spads.spad_count, spads.is_aperture);
    }
    if let Some(reference) = summary.reference {
        println!(
            "   Reference: VHV {} / phase {}",
            reference.vhv_settings, reference.phase_cal
        );
    }
    if let Some(offset) = summary.offset_um {
        println!("   Offset:    {} µm", offset);
    }
    if let Some(crosstalk) = summary.crosstalk {
        println!("   Crosstalk: {}", crosstalk);
    }
    for failure in summary.failures.iter().chain(&stop.failures) {
        println!("   ❌ {}", failure);
    }

    if summary.is_complete() {
        println!("✅ All calibrations done");
        Ok(())
    } else {
        bail!("{} calibration step(s) failed", summary.failures.len())
    }
}
