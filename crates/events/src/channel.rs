use crate::event::Event;

use std::fmt;

/// A logical message stream: a topic paired with an event type.
///
/// Used as the key for routing inbound messages and for looking up
/// per-channel codecs, filters and throttlers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    topic: String,
    event_type: String,
}

impl Channel {
    /// Creates a new channel.
    pub fn new<K, E>(topic: K, event_type: E) -> Self
    where
        K: Into<String>,
        E: Into<String>,
    {
        Self {
            topic: topic.into(),
            event_type: event_type.into(),
        }
    }

    /// The topic (or topic filter) of the channel.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The event type of the channel.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

impl<T> From<&Event<T>> for Channel {
    fn from(event: &Event<T>) -> Self {
        Self::new(event.topic(), event.event_type())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.topic, self.event_type)
    }
}
