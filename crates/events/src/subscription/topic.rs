use super::Shared;
use super::handle::SubscribeStatus;
use crate::event::Message;
use crate::transport::{MessageListener, Transport};

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// A subscribe attempt is in flight.
    Pending,
    /// The last attempt failed and another is scheduled.
    Retrying,
    /// The transport confirmed the subscription.
    Active,
    /// The topic was released.
    Cancelled,
}

/// Owns the transport subscription for one topic filter.
///
/// Created when the first subscription for the topic is registered, and
/// released with the last one. The handle is the transport listener for its
/// topic and runs the subscribe attempts until one succeeds or the handle is
/// no longer registered.
pub(crate) struct TopicHandle<Tr: Transport> {
    topic: String,
    shared: Weak<Shared<Tr>>,
    state: Mutex<State>,
    status: watch::Sender<Option<SubscribeStatus>>,
}

impl<Tr: Transport> TopicHandle<Tr> {
    pub(crate) fn new(topic: String, shared: Weak<Shared<Tr>>) -> Arc<Self> {
        let (status, _) = watch::channel(None);

        Arc::new(Self {
            topic,
            shared,
            state: Mutex::new(State::Pending),
            status,
        })
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }

    pub(crate) fn status(&self) -> watch::Receiver<Option<SubscribeStatus>> {
        self.status.subscribe()
    }

    /// Marks the handle released. Resolves the status as cancelled if the
    /// transport had not confirmed the subscription yet.
    pub(crate) fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), State::Cancelled);

        if matches!(previous, State::Pending | State::Retrying) {
            debug!("cancelled pending subscription to '{}'", self.topic);
            self.status.send_replace(Some(SubscribeStatus::Cancelled));
        }
    }

    /// Moves to `next` unless cancelled. Returns whether the move happened.
    fn transition(&self, next: State) -> bool {
        let mut state = self.state.lock();
        if *state == State::Cancelled {
            return false;
        }
        *state = next;
        true
    }

    /// Issues subscribe attempts until one succeeds, the handle is cancelled
    /// or it is no longer the registered handle for its topic.
    pub(crate) async fn run(self: Arc<Self>) {
        let mut attempt = 1_u32;

        loop {
            let Some(shared) = self.shared.upgrade() else {
                return;
            };

            if !shared.is_current(&self) {
                debug!(
                    "topic '{}' no longer has subscribers, skipping subscribe",
                    self.topic
                );
                return;
            }

            if !self.transition(State::Pending) {
                return;
            }

            let listener: Arc<dyn MessageListener> = self.clone();
            let result = shared.try_subscribe(&self.topic, listener).await;

            match result {
                Ok(()) => {
                    self.confirm(&shared).await;
                    return;
                }
                Err(e) => {
                    if !self.transition(State::Retrying) {
                        debug!(
                            "subscribe to '{}' failed after cancellation: {}",
                            self.topic, e
                        );
                        return;
                    }

                    let delay = shared.config.retry_delay;
                    warn!(
                        "failed to subscribe to '{}' (attempt {}): {}; retrying in {:?}",
                        self.topic, attempt, e, delay
                    );

                    drop(shared);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn confirm(&self, shared: &Shared<Tr>) {
        if self.transition(State::Active) {
            info!("subscribed to '{}'", self.topic);
            self.status.send_replace(Some(SubscribeStatus::Subscribed));
            return;
        }

        // The topic was released while the attempt was in flight.
        debug!(
            "subscription to '{}' confirmed after cancellation, releasing it",
            self.topic
        );
        shared.unsubscribe_topic(&self.topic).await;
    }
}

#[async_trait]
impl<Tr: Transport> MessageListener for TopicHandle<Tr> {
    async fn on_message(&self, message: Message) {
        if let Some(shared) = self.shared.upgrade() {
            shared.dispatch(&self.topic, message).await;
        }
    }
}
