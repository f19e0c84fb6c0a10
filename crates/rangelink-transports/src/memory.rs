// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process loopback transport
//!
//! A bounded queue that behaves like a lossy datagram link: when full, the
//! oldest datagram is dropped. Used to run a streamer and a receiver in one
//! process without touching the network.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::common::{StatsCounters, TransportError, TransportResult};
use crate::traits::{DatagramReceiver, DatagramSender, Transport, TransportStats};

/// Default queue depth
pub const DEFAULT_CAPACITY: usize = 1024;

struct Shared {
    queue: Mutex<Queue>,
    ready: Condvar,
    stats: StatsCounters,
}

struct Queue {
    datagrams: VecDeque<Vec<u8>>,
    capacity: usize,
    dropped: u64,
    senders_open: bool,
}

/// Create a connected sender/receiver pair
pub fn memory_channel(capacity: usize) -> (MemorySender, MemoryReceiver) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(Queue {
            datagrams: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            dropped: 0,
            senders_open: true,
        }),
        ready: Condvar::new(),
        stats: StatsCounters::default(),
    });
    (
        MemorySender {
            shared: Arc::clone(&shared),
            running: false,
        },
        MemoryReceiver {
            shared,
            running: false,
            timeout: None,
        },
    )
}

/// Sending half of a [`memory_channel`]
pub struct MemorySender {
    shared: Arc<Shared>,
    running: bool,
}

impl MemorySender {
    /// Datagrams discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.shared.queue.lock().dropped
    }
}

impl Transport for MemorySender {
    fn start(&mut self) -> TransportResult<()> {
        if self.running {
            return Err(TransportError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn transport_type(&self) -> &str {
        "memory"
    }
}

impl DatagramSender for MemorySender {
    fn send(&self, data: &[u8]) -> TransportResult<()> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        {
            let mut queue = self.shared.queue.lock();
            if queue.datagrams.len() >= queue.capacity {
                queue.datagrams.pop_front();
                queue.dropped += 1;
                trace!("Loopback queue full, dropped oldest datagram");
            }
            queue.datagrams.push_back(data.to_vec());
        }
        self.shared.stats.record_sent(data.len());
        self.shared.ready.notify_one();
        Ok(())
    }
}

impl Drop for MemorySender {
    fn drop(&mut self) {
        self.shared.queue.lock().senders_open = false;
        self.shared.ready.notify_all();
    }
}

/// Receiving half of a [`memory_channel`]
pub struct MemoryReceiver {
    shared: Arc<Shared>,
    running: bool,
    timeout: Option<Duration>,
}

impl MemoryReceiver {
    /// Set the timeout used by [`DatagramReceiver::receive`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Datagrams waiting to be received
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().datagrams.len()
    }

    /// Take everything queued without blocking
    pub fn drain(&self) -> Vec<Vec<u8>> {
        let drained: Vec<Vec<u8>> = self.shared.queue.lock().datagrams.drain(..).collect();
        for datagram in &drained {
            self.shared.stats.record_received(datagram.len());
        }
        drained
    }

    fn wait(&self, timeout: Option<Duration>) -> TransportResult<Vec<u8>> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        let mut queue = self.shared.queue.lock();
        loop {
            if let Some(datagram) = queue.datagrams.pop_front() {
                drop(queue);
                self.shared.stats.record_received(datagram.len());
                return Ok(datagram);
            }
            if !queue.senders_open {
                return Err(TransportError::ChannelClosed);
            }
            match timeout {
                Some(timeout) => {
                    if self.shared.ready.wait_for(&mut queue, timeout).timed_out()
                        && queue.datagrams.is_empty()
                    {
                        return Err(TransportError::Timeout);
                    }
                }
                None => self.shared.ready.wait(&mut queue),
            }
        }
    }
}

impl Transport for MemoryReceiver {
    fn start(&mut self) -> TransportResult<()> {
        if self.running {
            return Err(TransportError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn transport_type(&self) -> &str {
        "memory"
    }
}

impl DatagramReceiver for MemoryReceiver {
    fn receive(&self) -> TransportResult<Vec<u8>> {
        self.wait(self.timeout)
    }

    fn receive_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        self.wait(Some(Duration::from_millis(timeout_ms)))
    }
}

impl TransportStats for MemoryReceiver {
    fn messages_sent(&self) -> u64 {
        self.shared.stats.messages_sent()
    }

    fn messages_received(&self) -> u64 {
        self.shared.stats.messages_received()
    }

    fn bytes_sent(&self) -> u64 {
        self.shared.stats.bytes_sent()
    }

    fn bytes_received(&self) -> u64 {
        self.shared.stats.bytes_received()
    }

    fn error_count(&self) -> u64 {
        self.shared.stats.error_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(capacity: usize) -> (MemorySender, MemoryReceiver) {
        let (mut tx, mut rx) = memory_channel(capacity);
        tx.start().unwrap();
        rx.start().unwrap();
        (tx, rx)
    }

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = started(8);
        tx.send(b"1 ").unwrap();
        tx.send(b"2 ").unwrap();
        assert_eq!(rx.receive_timeout(10).unwrap(), b"1 ");
        assert_eq!(rx.receive_timeout(10).unwrap(), b"2 ");
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let (tx, rx) = started(2);
        for frame in [b"a ", b"b ", b"c "] {
            tx.send(frame).unwrap();
        }
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.drain(), vec![b"b ".to_vec(), b"c ".to_vec()]);
    }

    #[test]
    fn test_timeout_and_close() {
        let (tx, rx) = started(2);
        assert!(matches!(rx.receive_timeout(5), Err(TransportError::Timeout)));

        tx.send(b"last ").unwrap();
        drop(tx);
        assert_eq!(rx.receive_timeout(5).unwrap(), b"last ");
        assert!(matches!(rx.receive(), Err(TransportError::ChannelClosed)));
    }

    #[test]
    fn test_stats_are_shared() {
        let (tx, rx) = started(4);
        tx.send(b"12 34 ").unwrap();
        rx.receive_timeout(10).unwrap();
        assert_eq!(rx.messages_sent(), 1);
        assert_eq!(rx.messages_received(), 1);
        assert_eq!(rx.bytes_received(), 6);
    }

    #[test]
    fn test_requires_start() {
        let (tx, rx) = memory_channel(1);
        assert!(matches!(tx.send(b"x"), Err(TransportError::NotRunning)));
        assert!(matches!(rx.receive_timeout(1), Err(TransportError::NotRunning)));
    }
}
