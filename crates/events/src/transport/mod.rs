//! Transport abstraction for MQTT-style brokers.
//!
//! Transports handle:
//! - Connection management, reconnection and backoff
//! - The wire protocol and QoS delivery guarantees
//! - Invoking a [`MessageListener`] for every inbound message on a
//!   subscribed topic filter
//!
//! The outcome of a subscribe or publish attempt is the result of the
//! returned future: `Ok(())` on success, [`TransportError::Timeout`] if the
//! broker did not answer in time, and any other error on failure.

mod error;

pub use error::TransportError;

use crate::event::Message;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Receives inbound messages for a subscribed topic filter.
#[async_trait]
pub trait MessageListener: Send + Sync + 'static {
    /// Handles a message received on the subscribed topic filter.
    async fn on_message(&self, message: Message);
}

/// Transport trait for connecting, subscribing and publishing.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect to the broker.
    ///
    /// May block until the transport's own connection timeout. Must be
    /// idempotent if the transport is already connected.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Whether the transport currently holds a connection.
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic filter.
    ///
    /// Subscribing again to the same filter replaces the listener.
    async fn subscribe(
        &self,
        topic_filter: &str,
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), TransportError>;

    /// Unsubscribe from a topic filter.
    async fn unsubscribe(&self, topic_filter: &str) -> Result<(), TransportError>;

    /// Publish a message, optionally bounded by a timeout.
    async fn publish(
        &self,
        message: Message,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError>;
}
