//! A transport whose outcomes are scripted by the test.

use crate::event::{Message, QoS};
use crate::transport::{MessageListener, Transport, TransportError};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

/// What a scripted call does.
#[derive(Clone, Debug)]
pub enum Step {
    Succeed,
    Fail(TransportError),
    /// Never completes.
    Hang,
    /// Succeeds after a delay.
    Delay(Duration),
}

impl Step {
    async fn run(self) -> Result<(), TransportError> {
        match self {
            Self::Succeed => Ok(()),
            Self::Fail(e) => Err(e),
            Self::Hang => futures::future::pending().await,
            Self::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    connected: AtomicBool,
    hang_connect: AtomicBool,
    connect_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    subscribe_steps: Mutex<VecDeque<Step>>,
    publish_steps: Mutex<VecDeque<Step>>,
    listeners: Mutex<HashMap<String, Arc<dyn MessageListener>>>,
    published: Mutex<Vec<(Message, Option<Duration>)>>,
}

impl ScriptedTransport {
    /// A connected transport on which every call succeeds.
    pub fn new() -> Self {
        let transport = Self::default();
        transport.connected.store(true, Ordering::SeqCst);
        transport
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn hang_connect(&self) {
        self.hang_connect.store(true, Ordering::SeqCst);
    }

    /// Queues outcomes for the next subscribe calls. Unscripted calls succeed.
    pub fn script_subscribe(&self, steps: impl IntoIterator<Item = Step>) {
        self.subscribe_steps.lock().extend(steps);
    }

    /// Queues outcomes for the next publish calls. Unscripted calls succeed.
    pub fn script_publish(&self, steps: impl IntoIterator<Item = Step>) {
        self.publish_steps.lock().extend(steps);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<(Message, Option<Duration>)> {
        self.published.lock().clone()
    }

    pub fn is_subscribed(&self, topic_filter: &str) -> bool {
        self.listeners.lock().contains_key(topic_filter)
    }

    /// Hands a JSON payload to the listener of a topic filter, as if the
    /// broker had delivered it. Returns false if nothing is subscribed.
    pub async fn deliver(&self, topic_filter: &str, topic: &str, payload: &str) -> bool {
        let listener = self.listeners.lock().get(topic_filter).cloned();

        match listener {
            Some(listener) => {
                listener
                    .on_message(Message::new(topic, QoS::AtMostOnce, payload.to_string()))
                    .await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if self.hang_connect.load(Ordering::SeqCst) {
            return Step::Hang.run().await;
        }

        // Give concurrent callers a chance to pile up on the gate.
        tokio::task::yield_now().await;
        self.connected.store(true, Ordering::SeqCst);
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
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        let step = self.subscribe_steps.lock().pop_front().unwrap_or(Step::Succeed);
        step.run().await?;

        self.listeners
            .lock()
            .insert(topic_filter.to_string(), listener);
        Ok(())
    }

    async fn unsubscribe(&self, topic_filter: &str) -> Result<(), TransportError> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().remove(topic_filter);
        Ok(())
    }

    async fn publish(
        &self,
        message: Message,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let step = self.publish_steps.lock().pop_front().unwrap_or(Step::Succeed);
        step.run().await?;

        self.published.lock().push((message, timeout));
        Ok(())
    }
}
