//! # rangelink-transports
//!
//! Datagram transport layer for rangelink. The streamer pushes one text
//! frame per sampling cycle through a [`DatagramSender`]; the receiver pulls
//! them from a [`DatagramReceiver`].
//!
//! ## Feature Flags
//!
//! - `udp`: UDP sender and receiver on `std::net::UdpSocket`
//! - `memory`: in-process loopback used by tests and single-process demos
//!
//! ## Example: UDP
//!
//! ```no_run
//! use rangelink_transports::udp::{UdpReceiver, UdpSender};
//! use rangelink_transports::traits::{DatagramReceiver, DatagramSender, Transport};
//!
//! let mut receiver = UdpReceiver::with_address("127.0.0.1:5005")?;
//! receiver.start()?;
//!
//! let mut sender = UdpSender::with_address("127.0.0.1:5005")?;
//! sender.start()?;
//! sender.send(b"123 X 456 ")?;
//!
//! let frame = receiver.receive()?;
//! println!("{}", String::from_utf8_lossy(&frame));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod common;
pub mod traits;

#[cfg(feature = "udp")]
pub mod udp;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export commonly used types
pub use common::{StatsCounters, TransportConfig, TransportError, TransportResult};
pub use traits::{DatagramReceiver, DatagramSender, Transport, TransportStats};

#[cfg(feature = "memory")]
pub use memory::{memory_channel, MemoryReceiver, MemorySender};

#[cfg(feature = "udp")]
pub use udp::{UdpReceiver, UdpSender};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::traits::*;
}
