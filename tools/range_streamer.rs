// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Range Streamer

Finds every ranging sensor behind the multiplexer, starts them, and streams
one text frame per sampling cycle over UDP until Ctrl-C.

Usage:
  cargo run --bin range_streamer -- [debug|info] [--config PATH] [--target HOST:PORT] [--profile NAME] [--filter]

Example:
  cargo run --bin range_streamer -- info --target 192.168.1.20:5005 --profile long_range
*/

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rangelink::acquisition::{discover, LifecycleController};
use rangelink::config::{load_config, validate_config};
use rangelink::observability::{DebugFlags, Verbosity};
use rangelink::session::{SessionOptions, StreamSession};
use rangelink::setup::{
    address_space_from, filter_config_from, init_logging, min_cycle_from, profile_from,
    simulated_bus_from_config,
};
use rangelink::transports::{Transport, TransportConfig, UdpSender};

/// Stream time-of-flight distances as UDP text frames
#[derive(Parser, Debug)]
#[command(name = "range_streamer", version, about, long_about = None)]
struct Args {
    /// Discovery detail: `info` lists found sensors, `debug` every probe
    verbosity: Option<Verbosity>,

    /// Path to rangelink.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Receiver address (HOST:PORT)
    #[arg(long)]
    target: Option<String>,

    /// Ranging profile (good_accuracy, better_accuracy, best_accuracy, long_range, high_speed)
    #[arg(long)]
    profile: Option<String>,

    /// Smooth readings before sending them
    #[arg(long, default_value_t = false)]
    filter: bool,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    // --debug-{crate} flags are not clap arguments
    let (debug_args, cli_args): (Vec<String>, Vec<String>) =
        env::args().partition(|arg| arg.starts_with("--debug-"));
    let args = Args::parse_from(cli_args);
    let mut flags = DebugFlags::from_args(debug_args).with_env();
    flags.verbosity = args.verbosity.unwrap_or_default();

    let mut overrides = HashMap::new();
    if let Some(target) = &args.target {
        overrides.insert("target".to_string(), target.clone());
    }
    if let Some(profile) = &args.profile {
        overrides.insert("profile".to_string(), profile.clone());
    }
    if args.filter {
        overrides.insert("filter_before_send".to_string(), "true".to_string());
    }

    let config =
        load_config(args.config.as_deref(), Some(&overrides)).context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;
    let _log_guard = init_logging(&flags, &config.logging)?;

    let profile = profile_from(&config.bus)?;

    let mut bus = simulated_bus_from_config(&config);
    let report = discover(&mut bus, &address_space_from(&config.bus));
    for probe in &report.probes {
        match probe.error() {
            None if flags.verbosity >= Verbosity::Info => println!("  ✓ sensor at {}", probe.address),
            Some(e) if flags.verbosity >= Verbosity::Debug => println!("  · {}", e),
            _ => {}
        }
    }
    let controller = LifecycleController::new(bus, report.devices)
        .context("No ranging sensor found")?
        .with_min_cycle(min_cycle_from(&config));

    let mut sender = UdpSender::new(
        TransportConfig::new(config.stream.target())
            .with_bind_address(config.stream.bind_address.clone()),
    )?;
    sender
        .start()
        .with_context(|| format!("Failed to open UDP socket for {}", config.stream.target()))?;

    let options = SessionOptions {
        profile,
        filter: config
            .sampling
            .filter_before_send
            .then(|| filter_config_from(&config.filter)),
        send_discovery_frame: config.stream.send_discovery_frame,
        max_cycles: args.cycles,
        paced: true,
    };
    let session = StreamSession::new(controller, sender, options)?;

    let running = session.running_flag();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let summary = session.run()?;

    println!(
        "📊 {} cycle(s), {} frame(s) sent, {} send failure(s)",
        summary.cycles, summary.frames_sent, summary.send_failures
    );
    for (index, faults) in summary.faults.iter().enumerate() {
        if *faults > 0 {
            println!("   device {}: {} faulty sample(s)", index, faults);
        }
    }
    for failure in summary.start.failures.iter().chain(&summary.stop.failures) {
        println!("   ⚠ {}", failure);
    }
    Ok(())
}
