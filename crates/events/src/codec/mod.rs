//! Codecs convert events to and from transport messages.
//!
//! Codecs work on events whose payload has already been converted to a
//! codec-neutral [`Value`], which keeps marshallers and unmarshallers object
//! safe and lets them be registered per channel regardless of payload type.

mod error;

/// The default JSON codec.
pub mod json;

pub use error::{MarshalError, UnmarshalError};
pub use serde_value::Value;

use crate::event::{Event, Message};

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Channel-identifying metadata carried by every encoded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMetadata {
    /// The event type.
    pub event_type: String,
}

/// Encodes events into transport messages.
pub trait EventMarshaller: Debug + Send + Sync + 'static {
    /// Creates a message for an event.
    ///
    /// # Errors
    /// Returns an error if the event cannot be represented by this codec.
    fn marshal(&self, event: &Event<Value>) -> Result<Message, MarshalError>;
}

/// Decodes transport messages into events.
pub trait EventUnmarshaller: Debug + Send + Sync + 'static {
    /// Decodes only the metadata needed to route the message.
    ///
    /// # Errors
    /// Returns an error if the message does not carry an event type.
    fn metadata(&self, message: &Message) -> Result<EventMetadata, UnmarshalError>;

    /// Decodes the whole event.
    ///
    /// # Errors
    /// Returns an error if the message is malformed.
    fn unmarshal(&self, message: &Message) -> Result<Event<Value>, UnmarshalError>;
}

/// Converts a payload into its codec-neutral form.
///
/// # Errors
/// Returns an error if the payload cannot be serialized.
pub fn to_value<T>(payload: &T) -> Result<Value, MarshalError>
where
    T: Serialize + ?Sized,
{
    serde_value::to_value(payload).map_err(|e| MarshalError::Payload(e.to_string()))
}

/// Converts a typed event into its codec-neutral form.
///
/// # Errors
/// Returns an error if the payload cannot be serialized.
pub fn erase<T>(event: Event<T>) -> Result<Event<Value>, MarshalError>
where
    T: Serialize,
{
    event.try_map(|payload| to_value(&payload))
}

/// Converts a codec-neutral event into a typed one.
///
/// Text codecs carry map keys as strings, so a payload that does not match
/// `T` directly is retried through `serde_json`, which parses numeric and
/// boolean map keys back from their string form.
///
/// # Errors
/// Returns an error if the payload does not have the shape of `T`.
pub fn restore<T>(event: Event<Value>) -> Result<Event<T>, UnmarshalError>
where
    T: DeserializeOwned,
{
    event.try_map(|payload| match payload.clone().deserialize_into() {
        Ok(payload) => Ok(payload),
        Err(direct) => serde_json::to_value(&payload)
            .and_then(serde_json::from_value)
            .map_err(|_| UnmarshalError::Payload(direct.to_string())),
    })
}
