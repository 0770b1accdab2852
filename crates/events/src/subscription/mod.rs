//! Subscribing to channels.
//!
//! Every logical subscription names a channel. Subscriptions whose channels
//! share a topic share the single transport subscription held by that
//! topic's handle; the handle is created with the first subscription and
//! released with the last.

mod handle;
mod registry;
mod subscriber;
mod topic;

pub use handle::{SubscribeStatus, Subscription};
pub use subscriber::Subscriber;

use crate::channel::Channel;
use crate::codec::{EventUnmarshaller, json::JsonUnmarshaller};
use crate::config::EventsConfig;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::event::Message;
use crate::extension::ExtensionRegistry;
use crate::filter::{AcceptAll, MessageFilter};
use crate::topic::validate_topic_filter;
use crate::transport::{MessageListener, Transport, TransportError};

use registry::{Removed, SubscriptionRegistry};
use subscriber::{Delivery, TypedDelivery};
use topic::TopicHandle;

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

pub(crate) struct Shared<Tr: Transport> {
    connector: Connector<Tr>,
    config: EventsConfig,
    tables: RwLock<SubscriptionRegistry<TopicHandle<Tr>>>,
    unmarshallers: ExtensionRegistry<dyn EventUnmarshaller>,
    filters: ExtensionRegistry<dyn MessageFilter>,
    /// Runtime that releases run on when the caller is outside one.
    runtime: Mutex<Option<Handle>>,
}

impl<Tr: Transport> Shared<Tr> {
    fn is_current(&self, handle: &Arc<TopicHandle<Tr>>) -> bool {
        self.tables.read().is_current(handle.topic(), handle)
    }

    fn contains_topic(&self, topic: &str) -> bool {
        self.tables.read().contains_topic(topic)
    }

    fn subscribers(&self, channel: &Channel) -> Vec<Arc<dyn Delivery>> {
        self.tables.read().subscribers(channel)
    }

    /// One subscribe attempt: connect if needed, then subscribe within the
    /// subscribe timeout.
    async fn try_subscribe(
        &self,
        topic: &str,
        listener: Arc<dyn MessageListener>,
    ) -> std::result::Result<(), TransportError> {
        self.connector.ensure_connected().await?;

        let subscribe = self.connector.transport().subscribe(topic, listener);
        match tokio::time::timeout(self.config.subscribe_timeout, subscribe).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn unsubscribe_topic(&self, topic: &str) {
        if self.contains_topic(topic) {
            debug!("topic '{}' was subscribed again, keeping it", topic);
            return;
        }

        match self.connector.transport().unsubscribe(topic).await {
            Ok(()) => info!("unsubscribed from '{}'", topic),
            Err(e) => warn!("failed to unsubscribe from '{}': {}", topic, e),
        }
    }

    fn remember_runtime(&self, runtime: &Handle) {
        let mut stored = self.runtime.lock();
        if stored.is_none() {
            *stored = Some(runtime.clone());
        }
    }

    /// Cancels a released handle and drops its transport subscription.
    ///
    /// The unsubscribe runs on the caller's runtime, or on the runtime the
    /// service first subscribed on when the caller has none.
    fn release(self: &Arc<Self>, handle: &TopicHandle<Tr>) {
        handle.cancel();

        let topic = handle.topic().to_string();
        let runtime = Handle::try_current()
            .ok()
            .or_else(|| self.runtime.lock().clone());
        match runtime {
            Some(runtime) => {
                let shared = Arc::clone(self);
                runtime.spawn(async move { shared.unsubscribe_topic(&topic).await });
            }
            None => warn!("no runtime available to unsubscribe from '{}'", topic),
        }
    }

    /// Routes a message received on `topic` to the subscriptions of its
    /// channel.
    async fn dispatch(&self, topic: &str, message: Message) {
        let metadata = match self.unmarshallers.default_value().metadata(&message) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("dropping message on '{}': {}", message.topic, e);
                return;
            }
        };

        let channel = Channel::new(topic, metadata.event_type);
        let subscribers = self.subscribers(&channel);
        if subscribers.is_empty() {
            trace!("no subscribers for {}", channel);
            return;
        }

        let channel_filter = self.filters.get(&channel);
        let accepted: Vec<_> = subscribers
            .into_iter()
            .filter(|delivery| {
                let filter = delivery
                    .filter()
                    .unwrap_or_else(|| Arc::clone(&channel_filter));

                match filter.is_included(&message) {
                    Ok(included) => included,
                    Err(e) => {
                        warn!(
                            "filter {:?} failed for subscription {} on {}: {}",
                            filter,
                            delivery.id(),
                            channel,
                            e
                        );
                        false
                    }
                }
            })
            .collect();

        if accepted.is_empty() {
            trace!("message on {} rejected by every filter", channel);
            return;
        }

        let event = match self.unmarshallers.get(&channel).unmarshal(&message) {
            Ok(event) => event,
            Err(e) => {
                error!("failed to decode message for {}: {}", channel, e);
                return;
            }
        };

        let channel = &channel;
        let deliveries = accepted.iter().map(|delivery| {
            let event = event.clone();
            async move {
                if let Err(e) = delivery.deliver(event).await {
                    error!(
                        "failed to deliver to subscription {} on {}: {}",
                        delivery.id(),
                        channel,
                        e
                    );
                }
            }
        });

        join_all(deliveries).await;
    }
}

/// Manages logical subscriptions on top of a transport.
///
/// Dropping the service releases every topic.
pub struct SubscriptionService<Tr: Transport> {
    shared: Arc<Shared<Tr>>,
}

impl<Tr: Transport> SubscriptionService<Tr> {
    /// Creates a service decoding events with the JSON codec by default.
    pub fn new(transport: Arc<Tr>, config: EventsConfig) -> Self {
        Self::with_unmarshaller(transport, config, Arc::new(JsonUnmarshaller))
    }

    /// Creates a service with a custom default unmarshaller.
    ///
    /// The default unmarshaller also reads the event type used to route every
    /// inbound message.
    pub fn with_unmarshaller(
        transport: Arc<Tr>,
        config: EventsConfig,
        unmarshaller: Arc<dyn EventUnmarshaller>,
    ) -> Self {
        let shared = Shared {
            connector: Connector::new(transport, config.connect_timeout),
            config,
            tables: RwLock::new(SubscriptionRegistry::new()),
            unmarshallers: ExtensionRegistry::new("unmarshaller", unmarshaller),
            filters: ExtensionRegistry::new("filter", Arc::new(AcceptAll)),
            runtime: Mutex::new(Handle::try_current().ok()),
        };

        Self {
            shared: Arc::new(shared),
        }
    }

    /// Subscribes to a channel using the channel's registered filter.
    ///
    /// The first subscription for a topic requests the transport
    /// subscription in the background; its outcome is reported by
    /// [`Subscription::status`]. Failed attempts are retried after the
    /// configured delay until one succeeds or the topic is released.
    ///
    /// # Errors
    /// Returns an error if the topic or event type is invalid, or if called
    /// outside a tokio runtime.
    pub fn subscribe<T, S>(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        subscriber: S,
    ) -> Result<Subscription>
    where
        T: DeserializeOwned + Send + 'static,
        S: Subscriber<T>,
    {
        self.add(topic.into(), event_type.into(), None, subscriber)
    }

    /// Subscribes to a channel with a filter of the subscriber's own.
    ///
    /// # Errors
    /// Same as [`SubscriptionService::subscribe`].
    pub fn subscribe_with_filter<T, S>(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        filter: Arc<dyn MessageFilter>,
        subscriber: S,
    ) -> Result<Subscription>
    where
        T: DeserializeOwned + Send + 'static,
        S: Subscriber<T>,
    {
        self.add(topic.into(), event_type.into(), Some(filter), subscriber)
    }

    fn add<T, S>(
        &self,
        topic: String,
        event_type: String,
        filter: Option<Arc<dyn MessageFilter>>,
        subscriber: S,
    ) -> Result<Subscription>
    where
        T: DeserializeOwned + Send + 'static,
        S: Subscriber<T>,
    {
        if let Err(source) = validate_topic_filter(&topic) {
            return Err(Error::InvalidTopic { topic, source });
        }
        if event_type.is_empty() {
            return Err(Error::EmptyEventType);
        }
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        self.shared.remember_runtime(&runtime);

        let id = Uuid::new_v4();
        let channel = Channel::new(topic, event_type);
        let delivery: Arc<dyn Delivery> =
            Arc::new(TypedDelivery::<T, S>::new(id, filter, subscriber));

        let (handle, created) = self.shared.tables.write().insert(
            channel.clone(),
            delivery,
            || TopicHandle::new(channel.topic().to_string(), Arc::downgrade(&self.shared)),
        );

        if created {
            debug!("subscribing to new topic '{}'", handle.topic());
            runtime.spawn(Arc::clone(&handle).run());
        }

        debug!("added subscription {} on {}", id, channel);

        Ok(Subscription::new(id, channel, handle.status()))
    }

    /// Removes a subscription. Releasing the last subscription of a topic
    /// unsubscribes the transport from it.
    ///
    /// Returns false if the subscription was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = self
            .shared
            .tables
            .write()
            .remove(subscription.channel(), subscription.id());

        match removed {
            Removed::NotFound => false,
            Removed::Subscription => {
                debug!(
                    "removed subscription {} on {}",
                    subscription.id(),
                    subscription.channel()
                );
                true
            }
            Removed::LastForTopic(handle) => {
                debug!(
                    "removed last subscription on '{}', releasing topic",
                    handle.topic()
                );
                self.shared.release(&handle);
                true
            }
        }
    }

    /// Removes every subscription and releases every topic.
    pub fn unsubscribe_all(&self) {
        let released = self.shared.tables.write().drain();

        for handle in &released {
            self.shared.release(handle);
        }
    }

    /// Registers the unmarshaller for a channel, returning the one replaced.
    pub fn register_unmarshaller(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        unmarshaller: Arc<dyn EventUnmarshaller>,
    ) -> Option<Arc<dyn EventUnmarshaller>> {
        self.shared
            .unmarshallers
            .register(Channel::new(topic, event_type), unmarshaller)
    }

    /// Reverts a channel to the default unmarshaller.
    pub fn unregister_unmarshaller(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Option<Arc<dyn EventUnmarshaller>> {
        self.shared
            .unmarshallers
            .unregister(&Channel::new(topic, event_type))
    }

    /// Registers the filter used by a channel's subscriptions that have no
    /// filter of their own, returning the one replaced.
    pub fn register_filter(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
        filter: Arc<dyn MessageFilter>,
    ) -> Option<Arc<dyn MessageFilter>> {
        self.shared
            .filters
            .register(Channel::new(topic, event_type), filter)
    }

    /// Reverts a channel to accepting every message.
    pub fn unregister_filter(
        &self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Option<Arc<dyn MessageFilter>> {
        self.shared
            .filters
            .unregister(&Channel::new(topic, event_type))
    }

    /// Number of topics with a transport subscription requested or held.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.shared.tables.read().topic_count()
    }

    /// Number of logical subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.shared.tables.read().subscription_count()
    }
}

impl<Tr: Transport> Drop for SubscriptionService<Tr> {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}
