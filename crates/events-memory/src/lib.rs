//! In-memory transport implementation for testing
//!
//! Transports attached to the same [`MemoryBroker`] see each other's
//! messages, which makes this useful for tests and local development.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use proven_events::topic::{topic_matches_filter, validate_topic, validate_topic_filter};
use proven_events::{Message, MessageListener, Transport, TransportError};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, trace};
use uuid::Uuid;

type Listeners = RwLock<HashMap<String, Arc<dyn MessageListener>>>;

/// Routes messages between the transports connected to it.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    clients: Arc<DashMap<Uuid, Arc<Listeners>>>,
}

impl MemoryBroker {
    /// Creates a broker with no connected clients.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected transports.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Listeners of every connected client whose filter matches `topic`.
    fn matching(&self, topic: &str) -> Vec<Arc<dyn MessageListener>> {
        self.clients
            .iter()
            .flat_map(|client| {
                client
                    .value()
                    .read()
                    .iter()
                    .filter(|(filter, _)| topic_matches_filter(topic, filter))
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl std::fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("clients", &self.clients.len())
            .finish()
    }
}

/// Memory transport implementation
pub struct MemoryTransport {
    id: Uuid,
    broker: MemoryBroker,
    connected: AtomicBool,
    listeners: Arc<Listeners>,
}

impl MemoryTransport {
    /// Creates a transport attached to a broker.
    #[must_use]
    pub fn new(broker: MemoryBroker) -> Self {
        Self {
            id: Uuid::new_v4(),
            broker,
            connected: AtomicBool::new(false),
            listeners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The broker this transport is attached to.
    #[must_use]
    pub const fn broker(&self) -> &MemoryBroker {
        &self.broker
    }

    /// Drops the connection. Topic subscriptions are kept and resume when
    /// the transport connects again.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.broker.clients.remove(&self.id);
            info!("memory transport {} disconnected", self.id);
        }
    }

    /// Number of topic filters subscribed.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn check_connected(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(MemoryBroker::new())
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.broker
                .clients
                .insert(self.id, Arc::clone(&self.listeners));
            info!("memory transport {} connected", self.id);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn subscribe(
        &self,
        topic_filter: &str,
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), TransportError> {
        self.check_connected()?;
        validate_topic_filter(topic_filter).map_err(|e| TransportError::Rejected(e.to_string()))?;

        self.listeners
            .write()
            .insert(topic_filter.to_string(), listener);
        debug!("memory transport {} subscribed to '{}'", self.id, topic_filter);
        Ok(())
    }

    async fn unsubscribe(&self, topic_filter: &str) -> Result<(), TransportError> {
        if self.listeners.write().remove(topic_filter).is_some() {
            debug!(
                "memory transport {} unsubscribed from '{}'",
                self.id, topic_filter
            );
        }
        Ok(())
    }

    async fn publish(
        &self,
        message: Message,
        _timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        self.check_connected()?;
        validate_topic(&message.topic).map_err(|e| TransportError::Rejected(e.to_string()))?;

        let listeners = self.broker.matching(&message.topic);
        trace!(
            "delivering message on '{}' to {} listeners",
            message.topic,
            listeners.len()
        );

        for listener in listeners {
            listener.on_message(message.clone()).await;
        }

        Ok(())
    }
}
