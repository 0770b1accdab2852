use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Transport delivery guarantee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QoS {
    /// Fire and forget.
    #[default]
    AtMostOnce,
    /// Delivered at least once, possibly more.
    AtLeastOnce,
}

/// A typed event sent to, or received from, a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event<T> {
    topic: String,
    event_type: String,
    payload: T,
    delivery_mode: QoS,
}

impl<T> Event<T> {
    /// Creates an event with the default delivery mode.
    pub fn new<K, E>(topic: K, event_type: E, payload: T) -> Self
    where
        K: Into<String>,
        E: Into<String>,
    {
        Self {
            topic: topic.into(),
            event_type: event_type.into(),
            payload,
            delivery_mode: QoS::default(),
        }
    }

    /// Sets the delivery mode of the event.
    #[must_use]
    pub const fn with_delivery_mode(mut self, delivery_mode: QoS) -> Self {
        self.delivery_mode = delivery_mode;
        self
    }

    /// The topic the event is sent to. Other event types may share it.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The event type.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The event payload.
    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// The delivery mode of the event.
    #[must_use]
    pub const fn delivery_mode(&self) -> QoS {
        self.delivery_mode
    }

    /// Consumes the event, returning the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Replaces the payload, keeping topic, event type and delivery mode.
    pub fn map<U, F>(self, f: F) -> Event<U>
    where
        F: FnOnce(T) -> U,
    {
        Event {
            topic: self.topic,
            event_type: self.event_type,
            payload: f(self.payload),
            delivery_mode: self.delivery_mode,
        }
    }

    /// Like [`Event::map`] but the conversion may fail.
    ///
    /// # Errors
    /// Returns the error produced by `f`.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Event<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(Event {
            topic: self.topic,
            event_type: self.event_type,
            payload: f(self.payload)?,
            delivery_mode: self.delivery_mode,
        })
    }
}

/// A raw transport message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The concrete topic the message was sent to.
    pub topic: String,
    /// Delivery guarantee requested for the message.
    pub qos: QoS,
    /// Encoded payload.
    pub payload: Bytes,
}

impl Message {
    /// Creates a new message.
    pub fn new<K, P>(topic: K, qos: QoS, payload: P) -> Self
    where
        K: Into<String>,
        P: Into<Bytes>,
    {
        Self {
            topic: topic.into(),
            qos,
            payload: payload.into(),
        }
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    #[must_use]
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
