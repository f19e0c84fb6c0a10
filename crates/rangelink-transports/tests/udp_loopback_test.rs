// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! UDP sender/receiver over the local loopback interface

use std::time::Duration;

use rangelink_transports::{
    DatagramReceiver, DatagramSender, Transport, TransportConfig, TransportError, TransportStats,
    UdpReceiver, UdpSender,
};

fn bound_receiver(timeout: Duration) -> UdpReceiver {
    let mut receiver =
        UdpReceiver::new(TransportConfig::new("127.0.0.1:0").with_timeout(timeout)).unwrap();
    receiver.start().unwrap();
    receiver
}

fn sender_to(receiver: &UdpReceiver) -> UdpSender {
    let target = receiver.local_addr().unwrap();
    let mut sender = UdpSender::with_address(target.to_string()).unwrap();
    sender.start().unwrap();
    sender
}

#[test]
fn test_frames_arrive_intact() {
    let receiver = bound_receiver(Duration::from_secs(2));
    let sender = sender_to(&receiver);

    sender.send(b"# 3 ").unwrap();
    sender.send(b"123 X 456 ").unwrap();

    assert_eq!(receiver.receive().unwrap(), b"# 3 ");
    assert_eq!(receiver.receive().unwrap(), b"123 X 456 ");
    assert_eq!(sender.stats().messages_sent(), 2);
    assert_eq!(receiver.stats().bytes_received(), 14);
}

#[test]
fn test_receive_times_out() {
    let receiver = bound_receiver(Duration::from_millis(20));
    let err = receiver.receive().unwrap_err();
    assert!(err.is_timeout());

    let err = receiver.receive_timeout(5).unwrap_err();
    assert!(matches!(err, TransportError::Timeout));
}

#[test]
fn test_oversized_datagram_is_refused_by_sender() {
    let receiver = bound_receiver(Duration::from_millis(50));
    let sender = sender_to(&receiver);

    let big = vec![b'1'; 129];
    assert!(matches!(
        sender.send(&big),
        Err(TransportError::MessageTooLarge { size: 129, max_size: 128 })
    ));
    assert_eq!(sender.stats().error_count(), 1);
}

#[test]
fn test_bind_conflict_is_reported() {
    let first = bound_receiver(Duration::from_millis(50));
    let taken = first.local_addr().unwrap().to_string();

    let mut second = UdpReceiver::with_address(taken).unwrap();
    assert!(matches!(second.start(), Err(TransportError::BindFailed(_))));
}
