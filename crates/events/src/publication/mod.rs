//! Publishing events.
//!
//! Each publish resolves the channel's throttler and marshaller, encodes the
//! event on the caller's task and sends it from a background task, so
//! connecting and waiting for the broker never block the producer.

mod result;

pub use result::{PublishHandle, PublishStatus};

use crate::channel::Channel;
use crate::codec::{EventMarshaller, Value, json::JsonMarshaller, to_value};
use crate::config::EventsConfig;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::event::{Event, Message};
use crate::extension::ExtensionRegistry;
use crate::throttle::{EventThrottler, IncludeAll};
use crate::topic::validate_topic;
use crate::transport::Transport;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Publishes events to a transport.
pub struct PublisherService<Tr: Transport> {
    connector: Arc<Connector<Tr>>,
    publish_timeout: Duration,
    marshallers: ExtensionRegistry<dyn EventMarshaller>,
    throttlers: ExtensionRegistry<dyn EventThrottler>,
}

impl<Tr: Transport> PublisherService<Tr> {
    /// Creates a publisher encoding events with the JSON codec by default.
    pub fn new(transport: Arc<Tr>, config: EventsConfig) -> Self {
        Self::with_marshaller(transport, config, Arc::new(JsonMarshaller::new()))
    }

    /// Creates a publisher with a custom default marshaller.
    pub fn with_marshaller(
        transport: Arc<Tr>,
        config: EventsConfig,
        marshaller: Arc<dyn EventMarshaller>,
    ) -> Self {
        Self {
            connector: Arc::new(Connector::new(transport, config.connect_timeout)),
            publish_timeout: config.publish_timeout,
            marshallers: ExtensionRegistry::new("marshaller", marshaller),
            throttlers: ExtensionRegistry::new("throttler", Arc::new(IncludeAll)),
        }
    }

    /// Publishes an event.
    ///
    /// The event is throttled and encoded before this returns. Sending,
    /// including connecting the transport when needed, happens in the
    /// background and its outcome is reported by the returned handle.
    ///
    /// A throttled event is reported as [`PublishStatus::Throttled`] whatever
    /// its payload. If the payload cannot be serialized, the throttler sees
    /// it as [`Value::Unit`].
    ///
    /// # Errors
    /// Returns an error if the topic or event type is invalid, if an event
    /// that is not throttled cannot be encoded, or if a message must be sent
    /// outside a tokio runtime.
    pub fn publish<T>(&self, event: Event<T>) -> Result<PublishHandle>
    where
        T: Serialize,
    {
        if let Err(source) = validate_topic(event.topic()) {
            return Err(Error::InvalidTopic {
                topic: event.topic().to_string(),
                source,
            });
        }
        if event.event_type().is_empty() {
            return Err(Error::EmptyEventType);
        }

        let channel = Channel::from(&event);
        let (event, converted) = match to_value(event.payload()) {
            Ok(value) => (event.map(|_| value), Ok(())),
            Err(e) => (event.map(|_| Value::Unit), Err(e)),
        };

        if !self.throttlers.get(&channel).is_included(&event) {
            debug!("throttled event on {}", channel);
            return Ok(PublishHandle::ready(PublishStatus::Throttled));
        }
        converted?;

        let message = self.marshallers.get(&channel).marshal(&event)?;
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (tx, rx) = oneshot::channel();
        let connector = Arc::clone(&self.connector);
        let timeout = self.publish_timeout;

        runtime.spawn(async move {
            let status = send(&connector, message, timeout).await;
            let _ = tx.send(status);
        });

        Ok(PublishHandle::pending(rx))
    }

    /// Registers the marshaller for a channel, returning the one replaced.
    pub fn register_marshaller(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        marshaller: Arc<dyn EventMarshaller>,
    ) -> Option<Arc<dyn EventMarshaller>> {
        self.marshallers
            .register(Channel::new(topic, event_type), marshaller)
    }

    /// Reverts a channel to the default marshaller.
    pub fn unregister_marshaller(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Option<Arc<dyn EventMarshaller>> {
        self.marshallers
            .unregister(&Channel::new(topic, event_type))
    }

    /// Registers the throttler for a channel, returning the one replaced.
    pub fn register_throttler(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        throttler: Arc<dyn EventThrottler>,
    ) -> Option<Arc<dyn EventThrottler>> {
        self.throttlers
            .register(Channel::new(topic, event_type), throttler)
    }

    /// Reverts a channel to publishing every event.
    pub fn unregister_throttler(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Option<Arc<dyn EventThrottler>> {
        self.throttlers.unregister(&Channel::new(topic, event_type))
    }
}

async fn send<Tr: Transport>(
    connector: &Connector<Tr>,
    message: Message,
    timeout: Duration,
) -> PublishStatus {
    let topic = message.topic.clone();

    if let Err(e) = connector.ensure_connected().await {
        warn!("failed to connect before publishing to '{}': {}", topic, e);
        return PublishStatus::from_transport(e);
    }

    let publish = connector.transport().publish(message, Some(timeout));
    match tokio::time::timeout(timeout, publish).await {
        Ok(Ok(())) => {
            trace!("published to '{}'", topic);
            PublishStatus::Published
        }
        Ok(Err(e)) => {
            warn!("failed to publish to '{}': {}", topic, e);
            PublishStatus::from_transport(e)
        }
        Err(_) => {
            warn!("publish to '{}' timed out after {:?}", topic, timeout);
            PublishStatus::TimedOut
        }
    }
}
