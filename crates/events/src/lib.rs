//! Typed events over an MQTT-style transport.
//!
//! Producers publish [`Event`]s addressed by topic and event type; consumers
//! subscribe to [`Channel`]s. Many logical subscriptions share one transport
//! subscription per topic, and codecs, filters and throttlers can be swapped
//! per channel.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Channels identify logical message streams.
pub mod channel;

/// Encoding and decoding of events to transport messages.
pub mod codec;

/// Configuration shared by the publisher and the subscription service.
pub mod config;

mod connector;
mod error;

/// Events and transport messages.
pub mod event;

/// Per-channel registries of pluggable capabilities.
pub mod extension;

/// Filters decide which subscribers see an inbound message.
pub mod filter;

/// Publishing events.
pub mod publication;

/// Subscribing to channels.
pub mod subscription;

/// Throttlers decide which outbound events are sent.
pub mod throttle;

/// Topic validation and wildcard matching.
pub mod topic;

/// The transport contract consumed by this crate.
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use channel::Channel;
pub use config::EventsConfig;
pub use error::{Error, Result};
pub use event::{Event, Message, QoS};
pub use publication::{PublishHandle, PublishStatus, PublisherService};
pub use subscription::{SubscribeStatus, Subscriber, Subscription, SubscriptionService};
pub use transport::{MessageListener, Transport, TransportError};
