// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use rangelink_acquisition::{
    discover, AcquisitionError, AddressSpace, LifecycleController, ProbeOutcome,
};
use rangelink_hal::{BusEvent, DeviceAddress, SimulatedBus, SimulatedSensorSpec};

fn bus_with(channels: &[u8]) -> SimulatedBus {
    channels.iter().fold(SimulatedBus::multiplexed(0x70, 1), |bus, &ch| {
        bus.with_sensor(ch, SimulatedSensorSpec::at(100 + 10 * ch as i32))
    })
}

fn channels_of(mask: u8) -> Vec<u8> {
    (0..8).filter(|ch| mask & (1 << ch) != 0).collect()
}

#[test]
fn discovery_finds_exactly_the_populated_channels_in_order() {
    let masks: [u8; 10] = [
        0b0000_0001,
        0b1000_0000,
        0b0010_0101,
        0b0101_0101,
        0b1010_1010,
        0b0111_1110,
        0b1111_0000,
        0b0111_1111,
        0b1111_1110,
        0b1111_1111,
    ];

    for mask in masks {
        let expected = channels_of(mask);
        let mut bus = bus_with(&expected);
        let report = discover(&mut bus, &AddressSpace::default());

        assert_eq!(report.channels(), expected, "mask {:08b}", mask);
        for (position, device) in report.devices.iter().enumerate() {
            assert_eq!(device.index(), position);
            assert!(device.timing_budget_us() > 0);
        }
    }
}

#[test]
fn every_probe_stops_ranging() {
    let mut bus = bus_with(&[1, 4, 6]);
    let monitor = bus.monitor();
    let report = discover(&mut bus, &AddressSpace::default());

    assert_eq!(report.probes.len(), 8);
    for record in &report.probes {
        assert!(record.ranging_started, "channel {}", record.channel());
        assert!(record.ranging_stopped, "channel {}", record.channel());
        assert_eq!(monitor.start_count(record.channel()), 1);
        assert_eq!(monitor.stop_count(record.channel()), 1);
    }
    assert!(monitor.ranging_channels().is_empty());
}

#[test]
fn empty_channels_are_inconclusive() {
    let mut bus = bus_with(&[3]);
    let report = discover(&mut bus, &AddressSpace::default());

    let absent: Vec<_> = report.probes.iter().filter(|p| !p.is_present()).collect();
    assert_eq!(absent.len(), 7);
    for record in absent {
        assert_eq!(record.timing_budget_us, 0);
        assert!(matches!(
            record.error(),
            Some(AcquisitionError::ProbeInconclusive { channel, .. }) if channel == record.channel()
        ));
    }
}

#[test]
fn failed_start_is_still_followed_by_stop() {
    let mut bus = SimulatedBus::multiplexed(0x70, 1)
        .with_sensor(0, SimulatedSensorSpec::at(200))
        .with_sensor(2, SimulatedSensorSpec::at(200).failing_start());
    let monitor = bus.monitor();
    let report = discover(&mut bus, &AddressSpace::default());

    assert_eq!(report.channels(), vec![0]);
    let record = &report.probes[2];
    assert!(!record.ranging_started);
    assert!(record.ranging_stopped);
    assert!(matches!(record.outcome, ProbeOutcome::Inconclusive { .. }));
    assert_eq!(monitor.stop_count(2), 1);
}

#[test]
fn probe_selects_each_channel_before_touching_it() {
    let mut bus = bus_with(&[0, 5]);
    let monitor = bus.monitor();
    discover(&mut bus, &AddressSpace::multiplexed(0x70, 0x29, 6));

    let events = monitor.events();
    for channel in 0..6u8 {
        let selected_at = events
            .iter()
            .position(|e| *e == BusEvent::Selected { channel })
            .expect("channel selected");
        let started_at = events
            .iter()
            .position(|e| matches!(e, BusEvent::RangingStarted { channel: c, .. } if *c == channel))
            .expect("channel probed");
        assert!(selected_at < started_at);
    }
}

#[test]
fn wrong_multiplexer_address_finds_nothing() {
    let mut bus = bus_with(&[0, 1]);
    let monitor = bus.monitor();
    let report = discover(&mut bus, &AddressSpace::multiplexed(0x71, 0x29, 8));

    assert!(report.is_empty());
    assert!(report.probes.iter().all(|p| !p.ranging_started));
    assert_eq!(monitor.start_count(0), 0);

    let result = LifecycleController::new(bus, report.devices);
    assert!(matches!(result, Err(AcquisitionError::NoDevices)));
}

#[test]
fn direct_sensor_is_discovered_without_multiplexer() {
    let mut bus = SimulatedBus::direct(1)
        .with_sensor_at(DeviceAddress::direct(0x29), SimulatedSensorSpec::at(420));
    let report = discover(&mut bus, &AddressSpace::direct(0x29));

    assert_eq!(report.devices.len(), 1);
    assert_eq!(report.devices[0].address(), &DeviceAddress::direct(0x29));
    assert!(!report.devices[0].address().is_multiplexed());
}

#[test]
fn discovery_is_deterministic() {
    let first = discover(&mut bus_with(&[2, 3, 7]), &AddressSpace::default());
    let second = discover(&mut bus_with(&[2, 3, 7]), &AddressSpace::default());

    assert_eq!(first.channels(), second.channels());
    assert_eq!(first.probes, second.probes);
}
