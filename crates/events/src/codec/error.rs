use thiserror::Error;

/// Errors that can occur when encoding an event.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MarshalError {
    /// The payload could not be serialized.
    #[error("failed to serialize payload: {0}")]
    Payload(String),

    /// The codec could not represent the event.
    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// Errors that can occur when decoding a message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnmarshalError {
    /// The event metadata could not be read.
    #[error("failed to decode event metadata: {0}")]
    Metadata(String),

    /// The message envelope is malformed.
    #[error("failed to decode event: {0}")]
    Envelope(String),

    /// The payload does not have the expected shape.
    #[error("failed to deserialize payload: {0}")]
    Payload(String),
}
