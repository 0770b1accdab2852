use thiserror::Error;

/// Errors reported by a transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport is not connected.
    #[error("not connected")]
    NotConnected,

    /// Connecting to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker rejected the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The broker did not answer in time.
    #[error("timed out")]
    Timeout,

    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Whether this error represents a timeout rather than a failure.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
