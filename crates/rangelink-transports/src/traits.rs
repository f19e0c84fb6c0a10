// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! These traits define the common interface for all datagram transports.
//! The streamer only needs a [`DatagramSender`], the receiver only a
//! [`DatagramReceiver`], so a UDP socket and an in-process loopback are
//! interchangeable in both.

use crate::common::TransportResult;

/// Lifecycle shared by every transport
pub trait Transport: Send + Sync {
    /// Open the underlying socket or channel
    fn start(&mut self) -> TransportResult<()>;

    /// Release it; sending or receiving afterwards yields `NotRunning`
    fn stop(&mut self) -> TransportResult<()>;

    fn is_running(&self) -> bool;

    /// Short name used in log lines ("udp", "memory")
    fn transport_type(&self) -> &str;
}

/// Fire-and-forget datagram sending
pub trait DatagramSender: Transport {
    /// Send one datagram. Delivery is not confirmed.
    fn send(&self, data: &[u8]) -> TransportResult<()>;
}

/// Datagram reception
pub trait DatagramReceiver: Transport {
    /// Next datagram, waiting at most the configured timeout
    fn receive(&self) -> TransportResult<Vec<u8>>;

    /// Next datagram, waiting at most `timeout_ms`
    fn receive_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>>;
}

/// Running counters kept by a transport
pub trait TransportStats {
    fn messages_sent(&self) -> u64;
    fn messages_received(&self) -> u64;
    fn bytes_sent(&self) -> u64;
    fn bytes_received(&self) -> u64;
    /// Failed sends and receives, including refused oversize datagrams
    fn error_count(&self) -> u64;
}
