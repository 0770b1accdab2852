use crate::codec::MarshalError;
use crate::topic::TopicError;

use thiserror::Error;

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced synchronously, or as the outcome of a publish, to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// The event type was empty.
    #[error("event type cannot be empty")]
    EmptyEventType,

    /// The topic was rejected.
    #[error("invalid topic '{topic}': {source}")]
    InvalidTopic {
        /// The offending topic.
        topic: String,
        /// Why it was rejected.
        source: TopicError,
    },

    /// The event could not be encoded.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// The background task stopped before reporting a result.
    #[error("task ended before reporting a result")]
    Abandoned,

    /// The call was made outside of a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,
}
