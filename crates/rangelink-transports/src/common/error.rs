//! Errors raised by the UDP and in-memory transports

pub type TransportResult<T> = Result<T, TransportError>;

/// Failure of a send, receive or lifecycle call
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the local socket
    #[error("cannot bind {0}")]
    BindFailed(String),

    /// Target address could not be resolved
    #[error("cannot resolve {0}")]
    InvalidAddress(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Nothing arrived within the read timeout
    #[error("no datagram before the timeout")]
    Timeout,

    /// Peer side of an in-process channel is gone
    #[error("loopback channel closed")]
    ChannelClosed,

    #[error("transport not started")]
    NotRunning,

    #[error("transport already started")]
    AlreadyRunning,

    #[error("bad transport config: {0}")]
    InvalidConfig(String),

    #[error("datagram of {size} bytes exceeds {max_size}")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Timeouts are expected on a receiver that polls a shutdown flag
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
