use crate::channel::Channel;

use tokio::sync::watch;
use uuid::Uuid;

/// Outcome of the transport subscription backing a [`Subscription`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscribeStatus {
    /// The transport confirmed the subscription.
    Subscribed,
    /// The topic was released before the transport confirmed it.
    Cancelled,
}

/// Handle to a logical subscription, used to unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: Uuid,
    channel: Channel,
    status: watch::Receiver<Option<SubscribeStatus>>,
}

impl Subscription {
    pub(crate) const fn new(
        id: Uuid,
        channel: Channel,
        status: watch::Receiver<Option<SubscribeStatus>>,
    ) -> Self {
        Self {
            id,
            channel,
            status,
        }
    }

    /// Unique id of the subscription.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The channel subscribed to.
    #[must_use]
    pub const fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Waits until the transport subscription for the topic is resolved.
    ///
    /// All subscriptions sharing a topic observe the same outcome.
    pub async fn status(&self) -> SubscribeStatus {
        let mut status = self.status.clone();
        status
            .wait_for(Option::is_some)
            .await
            .map_or(SubscribeStatus::Cancelled, |resolved| {
                resolved.unwrap_or(SubscribeStatus::Cancelled)
            })
    }

    /// The outcome, if already resolved.
    #[must_use]
    pub fn try_status(&self) -> Option<SubscribeStatus> {
        *self.status.borrow()
    }
}
