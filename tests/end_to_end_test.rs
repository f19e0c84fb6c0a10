// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Streamer to receiver over the in-memory loopback and over UDP

use std::sync::atomic::Ordering;
use std::time::Duration;

use rangelink::acquisition::{discover, AddressSpace, LifecycleController};
use rangelink::config::{load_config, validate_config, RangelinkConfig};
use rangelink::hal::{SimulatedBus, SimulatedSensorSpec};
use rangelink::receiver::{ReceiverEvent, ReceiverSession};
use rangelink::serialization::{CardinalityPolicy, StreamDecoder};
use rangelink::session::{SessionOptions, StreamSession};
use rangelink::setup::{address_space_from, filter_config_from, simulated_bus_from_config};
use rangelink::smoothing::FilterConfig;
use rangelink::transports::{memory_channel, Transport, TransportConfig, UdpReceiver, UdpSender};

fn three_sensor_bus() -> SimulatedBus {
    SimulatedBus::multiplexed(0x70, 11)
        .with_sensor(0, SimulatedSensorSpec::at(200))
        .with_sensor(2, SimulatedSensorSpec::at(300).faulty())
        .with_sensor(5, SimulatedSensorSpec::at(400))
}

fn unpaced(max_cycles: u64) -> SessionOptions {
    SessionOptions {
        max_cycles: Some(max_cycles),
        paced: false,
        ..Default::default()
    }
}

#[test]
fn test_three_sensors_with_one_faulting() {
    let mut bus = SimulatedBus::multiplexed(0x70, 11)
        .with_sensor(0, SimulatedSensorSpec::at(200).with_noise(1))
        .with_sensor(2, SimulatedSensorSpec::at(300).faulty())
        .with_sensor(5, SimulatedSensorSpec::at(400).with_noise(1));
    let monitor = bus.monitor();
    let report = discover(&mut bus, &AddressSpace::default());
    assert_eq!(report.channels(), vec![0, 2, 5]);

    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(64);
    tx.start().unwrap();
    rx.start().unwrap();

    let session = StreamSession::new(controller, tx, unpaced(10)).unwrap();
    let summary = session.run().unwrap();

    assert_eq!(summary.cycles, 10);
    assert_eq!(summary.frames_sent, 10);
    assert_eq!(summary.faults, vec![0, 10, 0]);
    assert!(summary.start.all_started());
    assert!(summary.stop.all_stopped());

    // Every device was stopped at teardown
    assert!(monitor.ranging_channels().is_empty());
    for channel in [0, 2, 5] {
        assert_eq!(monitor.start_count(channel), monitor.stop_count(channel));
    }

    let decoder = StreamDecoder::new(CardinalityPolicy::Reject, Some(FilterConfig::default()));
    let mut receiver = ReceiverSession::new(rx, decoder, 100);
    let mut events = Vec::new();
    let stats = receiver.run(|event, _| events.push(event.clone())).unwrap();

    assert_eq!(events.len(), 11);
    assert_eq!(events[0], ReceiverEvent::Locked { device_count: 3 });
    for event in &events[1..] {
        let ReceiverEvent::Frame(frame) = event else {
            panic!("expected a data frame, got {:?}", event);
        };
        assert_eq!(frame.faults, vec![false, true, false]);
        assert!((frame.raw[0] - 200).abs() <= 1, "raw {:?}", frame.raw);
        assert_eq!(frame.raw[1], 0);
        assert!((frame.raw[2] - 400).abs() <= 1, "raw {:?}", frame.raw);

        // The faulting sensor shows zero and the others stay on their target
        assert_eq!(frame.filtered[1], 0);
        assert!((frame.filtered[0] - 200).abs() <= 1, "filtered {:?}", frame.filtered);
        assert!((frame.filtered[2] - 400).abs() <= 1, "filtered {:?}", frame.filtered);
    }
    assert_eq!(stats.frames_accepted, 10);
    assert_eq!(stats.frames_rejected, 0);
    assert_eq!(receiver.window().len(), 10);
    assert_eq!(receiver.window().raw(1), Some(&[0; 10][..]));
    assert_eq!(receiver.window().filtered(1), Some(&[0; 10][..]));
}

#[test]
fn test_frames_on_the_wire() {
    let mut bus = three_sensor_bus();
    let report = discover(&mut bus, &AddressSpace::default());
    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(8);
    tx.start().unwrap();
    rx.start().unwrap();

    StreamSession::new(controller, tx, unpaced(2))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        rx.drain(),
        vec![b"# 3 ".to_vec(), b"200 X 400 ".to_vec(), b"200 X 400 ".to_vec()]
    );
}

#[test]
fn test_filter_before_send_smooths_noise() {
    let mut bus = SimulatedBus::multiplexed(0x70, 5)
        .with_sensor(1, SimulatedSensorSpec::at(500).with_noise(1));
    let report = discover(&mut bus, &AddressSpace::default());
    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(64);
    tx.start().unwrap();
    rx.start().unwrap();

    let options = SessionOptions {
        filter: Some(Default::default()),
        send_discovery_frame: false,
        ..unpaced(30)
    };
    StreamSession::new(controller, tx, options).unwrap().run().unwrap();

    let frames = rx.drain();
    assert_eq!(frames.len(), 30);
    // Once asleep the filter holds one value through the noise
    let tail: Vec<&Vec<u8>> = frames[20..].iter().collect();
    assert!(tail.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_cleared_flag_still_tears_down() {
    let mut bus = three_sensor_bus();
    let monitor = bus.monitor();
    let report = discover(&mut bus, &AddressSpace::default());
    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(8);
    tx.start().unwrap();
    rx.start().unwrap();

    let session = StreamSession::new(controller, tx, SessionOptions::default()).unwrap();
    session.running_flag().store(false, Ordering::SeqCst);
    let summary = session.run().unwrap();

    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.start.started, vec![0, 1, 2]);
    assert_eq!(summary.stop.stopped, vec![0, 1, 2]);
    assert!(monitor.ranging_channels().is_empty());
    // Only the discovery frame went out
    assert_eq!(rx.drain(), vec![b"# 3 ".to_vec()]);
}

#[test]
fn test_configured_simulation_streams_over_udp() {
    let mut config = RangelinkConfig::default();
    config.simulation.present_channels = vec![0, 2, 5];
    config.simulation.faulty_channels = vec![2];
    config.simulation.noise_mm = 0;

    let mut bus = simulated_bus_from_config(&config);
    let report = discover(&mut bus, &address_space_from(&config.bus));
    assert_eq!(report.channels(), vec![0, 2, 5]);
    let controller = LifecycleController::new(bus, report.devices).unwrap();

    let mut udp_rx =
        UdpReceiver::new(TransportConfig::new("127.0.0.1:0").with_timeout(Duration::from_secs(2)))
            .unwrap();
    udp_rx.start().unwrap();
    let target = udp_rx.local_addr().unwrap().to_string();
    let mut udp_tx = UdpSender::with_address(target).unwrap();
    udp_tx.start().unwrap();

    let summary = StreamSession::new(controller, udp_tx, unpaced(3))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.frames_sent, 3);

    let mut receiver =
        ReceiverSession::new(udp_rx, StreamDecoder::new(CardinalityPolicy::Reject, None), 100);
    let mut frames = Vec::new();
    while frames.len() < 3 {
        match receiver.poll().unwrap() {
            Some(ReceiverEvent::Frame(frame)) => frames.push(frame),
            Some(ReceiverEvent::Locked { device_count }) => assert_eq!(device_count, 3),
            Some(ReceiverEvent::Dropped(e)) => panic!("dropped: {}", e),
            None => panic!("timed out waiting for frames"),
        }
    }

    // base 300, step 40 per channel; channel 2 faulting
    for frame in frames {
        assert_eq!(frame.raw, vec![300, 0, 500]);
    }
}

#[test]
fn test_config_file_drives_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rangelink.toml");
    std::fs::write(
        &path,
        r#"
[sampling]
filter_before_send = false

[stream]
send_discovery_frame = false

[simulation]
present_channels = [1, 3]
base_distance_mm = 100
distance_step_mm = 10
noise_mm = 0
"#,
    )
    .unwrap();

    let config = load_config(Some(path.as_path()), None).unwrap();
    validate_config(&config).unwrap();

    let mut bus = simulated_bus_from_config(&config);
    let report = discover(&mut bus, &address_space_from(&config.bus));
    assert_eq!(report.channels(), vec![1, 3]);
    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(8);
    tx.start().unwrap();
    rx.start().unwrap();

    let options = SessionOptions {
        send_discovery_frame: config.stream.send_discovery_frame,
        ..unpaced(1)
    };
    StreamSession::new(controller, tx, options).unwrap().run().unwrap();

    assert_eq!(rx.drain(), vec![b"110 130 ".to_vec()]);
}

#[test]
fn test_default_filter_passes_long_distances() {
    let mut bus = SimulatedBus::multiplexed(0x70, 13).with_sensor(4, SimulatedSensorSpec::at(1500));
    let report = discover(&mut bus, &AddressSpace::default());
    let controller = LifecycleController::new(bus, report.devices).unwrap();
    let (mut tx, mut rx) = memory_channel(8);
    tx.start().unwrap();
    rx.start().unwrap();

    let config = RangelinkConfig::default();
    let options = SessionOptions {
        filter: Some(filter_config_from(&config.filter)),
        send_discovery_frame: false,
        ..unpaced(3)
    };
    StreamSession::new(controller, tx, options).unwrap().run().unwrap();

    assert_eq!(rx.drain(), vec![b"1500 ".to_vec(); 3]);
}
