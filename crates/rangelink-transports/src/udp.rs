// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! UDP transport implementations
//!
//! Connectionless, best-effort datagrams. Nothing is retransmitted; a lost
//! frame is simply a gap in the stream. Each datagram carries one complete
//! rangelink frame, so no chunking or reassembly is needed.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::common::{StatsCounters, TransportConfig, TransportError, TransportResult};
use crate::traits::{DatagramReceiver, DatagramSender, Transport};

fn resolve(address: &str) -> TransportResult<SocketAddr> {
    address
        .to_socket_addrs()
        .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", address, e)))?
        .next()
        .ok_or_else(|| TransportError::InvalidAddress(address.to_string()))
}

//region Sender

/// Sends datagrams to one fixed target
pub struct UdpSender {
    config: TransportConfig,
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
    stats: StatsCounters,
}

impl UdpSender {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::InvalidConfig)?;
        Ok(Self {
            config,
            socket: None,
            target: None,
            stats: StatsCounters::default(),
        })
    }

    /// Sender for `address` with default settings
    pub fn with_address(address: impl Into<String>) -> TransportResult<Self> {
        Self::new(TransportConfig::new(address))
    }

    /// Resolved target, once started
    pub fn target(&self) -> Option<SocketAddr> {
        self.target
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn stats(&self) -> &StatsCounters {
        &self.stats
    }
}

impl Transport for UdpSender {
    fn start(&mut self) -> TransportResult<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyRunning);
        }

        let target = resolve(&self.config.address)?;
        let bind = match &self.config.bind_address {
            Some(bind) => bind.clone(),
            None if target.is_ipv4() => "0.0.0.0:0".to_string(),
            None => "[::]:0".to_string(),
        };
        let socket = UdpSocket::bind(&bind)
            .map_err(|e| TransportError::BindFailed(format!("{}: {}", bind, e)))?;

        info!(
            "📤 UDP sender ready: {} -> {}",
            socket.local_addr().map_or_else(|_| bind.clone(), |a| a.to_string()),
            target
        );
        self.target = Some(target);
        self.socket = Some(socket);
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        if self.socket.take().is_some() {
            debug!("UDP sender to {} stopped", self.config.address);
        }
        self.target = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    fn transport_type(&self) -> &str {
        "udp"
    }
}

impl DatagramSender for UdpSender {
    fn send(&self, data: &[u8]) -> TransportResult<()> {
        let (socket, target) = match (&self.socket, self.target) {
            (Some(socket), Some(target)) => (socket, target),
            _ => return Err(TransportError::NotRunning),
        };
        if data.len() > self.config.max_message_size {
            self.stats.record_error();
            return Err(TransportError::MessageTooLarge {
                size: data.len(),
                max_size: self.config.max_message_size,
            });
        }

        match socket.send_to(data, target) {
            Ok(_) => {
                self.stats.record_sent(data.len());
                Ok(())
            }
            Err(e) => {
                self.stats.record_error();
                Err(TransportError::SendFailed(e.to_string()))
            }
        }
    }
}

//endregion

//region Receiver

/// Receives datagrams on a bound local address
pub struct UdpReceiver {
    config: TransportConfig,
    socket: Option<UdpSocket>,
    stats: StatsCounters,
}

impl UdpReceiver {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::InvalidConfig)?;
        Ok(Self {
            config,
            socket: None,
            stats: StatsCounters::default(),
        })
    }

    /// Receiver bound to `address` with default settings
    pub fn with_address(address: impl Into<String>) -> TransportResult<Self> {
        Self::new(TransportConfig::new(address))
    }

    /// Bound address, once started (resolves port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn stats(&self) -> &StatsCounters {
        &self.stats
    }

    fn recv(&self, socket: &UdpSocket) -> TransportResult<Vec<u8>> {
        // One spare byte tells an oversized datagram from one that fits exactly
        let max = self.config.max_message_size;
        let mut buffer = vec![0u8; max + 1];
        match socket.recv_from(&mut buffer) {
            Ok((size, peer)) if size > max => {
                self.stats.record_error();
                warn!("Dropping oversized datagram from {} (> {} bytes)", peer, max);
                Err(TransportError::MessageTooLarge {
                    size,
                    max_size: max,
                })
            }
            Ok((size, _)) => {
                buffer.truncate(size);
                self.stats.record_received(size);
                Ok(buffer)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                Err(TransportError::Timeout)
            }
            Err(e) => {
                self.stats.record_error();
                Err(TransportError::ReceiveFailed(e.to_string()))
            }
        }
    }
}

impl Transport for UdpReceiver {
    fn start(&mut self) -> TransportResult<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyRunning);
        }

        let socket = UdpSocket::bind(&self.config.address).map_err(|e| {
            TransportError::BindFailed(format!("{}: {}", self.config.address, e))
        })?;
        socket.set_read_timeout(self.config.timeout)?;

        info!(
            "📥 UDP receiver listening on {}",
            socket
                .local_addr()
                .map_or_else(|_| self.config.address.clone(), |a| a.to_string())
        );
        self.socket = Some(socket);
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        if self.socket.take().is_some() {
            debug!("UDP receiver on {} stopped", self.config.address);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    fn transport_type(&self) -> &str {
        "udp"
    }
}

impl DatagramReceiver for UdpReceiver {
    fn receive(&self) -> TransportResult<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotRunning)?;
        self.recv(socket)
    }

    fn receive_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotRunning)?;
        socket.set_read_timeout(Some(Duration::from_millis(timeout_ms.max(1))))?;
        let result = self.recv(socket);
        socket.set_read_timeout(self.config.timeout)?;
        result
    }
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_requires_start() {
        let sender = UdpSender::with_address("127.0.0.1:9").unwrap();
        assert!(matches!(sender.send(b"1 "), Err(TransportError::NotRunning)));
    }

    #[test]
    fn test_unresolvable_target() {
        let mut sender = UdpSender::with_address("not an address").unwrap();
        assert!(matches!(sender.start(), Err(TransportError::InvalidAddress(_))));
        assert!(!sender.is_running());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut receiver = UdpReceiver::with_address("127.0.0.1:0").unwrap();
        receiver.start().unwrap();
        assert!(matches!(receiver.start(), Err(TransportError::AlreadyRunning)));
        receiver.stop().unwrap();
        assert!(receiver.local_addr().is_none());
    }
}
