//! Error types for the chassis link

use std::io;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport error type
///
/// `ConnectionError` is fatal to construction. `ConnectionLost`,
/// `AckMismatch` and `InvalidMessage` end the worker that hit them; the
/// application then observes `Closed` on the affected side.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not establish (or accept) a connection
    #[error("Connection to {address} failed: {source}")]
    ConnectionError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Peer closed or transport aborted mid-operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Acknowledgment read back does not match the configured token
    #[error("Acknowledgment mismatch: expected {expected:?}, received {received:?}")]
    AckMismatch { expected: String, received: String },

    /// The link direction has terminated or the link was shut down
    #[error("Link closed")]
    Closed,

    /// Timeout occurred
    #[error("Operation timed out")]
    Timeout,

    /// Message exceeds the configured maximum size
    #[error("Message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    /// Payload is byte-identical to the acknowledgment token
    #[error("Payload {0:?} is reserved as the acknowledgment token")]
    ReservedPayload(String),

    /// Bounded transmit queue is full
    #[error("Transmit queue full ({capacity} messages pending)")]
    QueueFull { capacity: usize },

    /// Received bytes could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl TransportError {
    /// Wrap a failed connect/bind/accept with the address involved
    pub fn connection(address: impl Into<String>, source: io::Error) -> Self {
        Self::ConnectionError {
            address: address.into(),
            source,
        }
    }

    /// True for errors that mean the peer or socket is gone
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected => Self::ConnectionLost(err.to_string()),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}
