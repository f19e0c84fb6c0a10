// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Range Receiver

Listens for rangelink text frames, locks the sensor count, smooths each
sensor and prints the raw and filtered values.

Usage:
  cargo run --bin range_receiver -- [debug|info] [--config PATH] [--bind HOST:PORT] [--window N]
*/

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rangelink::config::{load_config, validate_config};
use rangelink::observability::{DebugFlags, Verbosity};
use rangelink::receiver::{ReceiverEvent, ReceiverSession};
use rangelink::serialization::StreamDecoder;
use rangelink::setup::{cardinality_policy_from, filter_config_from, init_logging, read_timeout_from};
use rangelink::transports::{Transport, TransportConfig, UdpReceiver};

/// Receive and decode rangelink distance frames
#[derive(Parser, Debug)]
#[command(name = "range_receiver", version, about, long_about = None)]
struct Args {
    /// `info` reports locks and dropped frames, `debug` every datagram
    verbosity: Option<Verbosity>,

    /// Path to rangelink.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local address to listen on (HOST:PORT)
    #[arg(long)]
    bind: Option<String>,

    /// Plot window width in samples
    #[arg(long)]
    window: Option<usize>,

    /// What to do with frames of the wrong size (reject or resize)
    #[arg(long)]
    policy: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let (debug_args, cli_args): (Vec<String>, Vec<String>) =
        env::args().partition(|arg| arg.starts_with("--debug-"));
    let args = Args::parse_from(cli_args);
    let mut flags = DebugFlags::from_args(debug_args).with_env();
    flags.verbosity = args.verbosity.unwrap_or_default();

    let mut overrides = HashMap::new();
    if let Some(bind) = &args.bind {
        overrides.insert("bind".to_string(), bind.clone());
    }
    if let Some(window) = args.window {
        overrides.insert("window_width".to_string(), window.to_string());
    }
    if let Some(policy) = &args.policy {
        overrides.insert("cardinality_policy".to_string(), policy.clone());
    }

    let config =
        load_config(args.config.as_deref(), Some(&overrides)).context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;
    let _log_guard = init_logging(&flags, &config.logging)?;

    let receiver_config = &config.receiver;
    let policy = cardinality_policy_from(receiver_config)?;
    let filter = receiver_config
        .filter_enabled
        .then(|| filter_config_from(&config.filter));

    let mut transport_config = TransportConfig::new(receiver_config.bind());
    transport_config = match read_timeout_from(receiver_config) {
        Some(timeout) => transport_config.with_timeout(timeout),
        None => transport_config.with_no_timeout(),
    };
    let mut receiver = UdpReceiver::new(transport_config)?;
    receiver
        .start()
        .with_context(|| format!("Failed to bind {}", receiver_config.bind()))?;

    let mut session = ReceiverSession::new(
        receiver,
        StreamDecoder::new(policy, filter),
        receiver_config.window_width,
    );

    let running = session.running_flag();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let stats = session.run(|event, window| match event {
        ReceiverEvent::Locked { device_count } => {
            println!("🔒 {} sensor(s)", device_count);
        }
        ReceiverEvent::Frame(frame) => {
            println!(
                "[{:>3}/{}] raw {:?} filtered {:?}",
                window.len(),
                window.width(),
                frame.raw,
                frame.filtered
            );
        }
        ReceiverEvent::Dropped(error) => {
            if flags.verbosity >= Verbosity::Info {
                println!("✗ {}", error);
            }
        }
    })?;

    println!(
        "📊 {} frame(s) accepted, {} rejected, {} malformed token(s)",
        stats.frames_accepted, stats.frames_rejected, stats.malformed_tokens
    );
    Ok(())
}
