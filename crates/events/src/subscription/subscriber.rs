use crate::codec::{UnmarshalError, Value, restore};
use crate::event::Event;
use crate::filter::MessageFilter;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Receives typed events for a channel.
///
/// Implemented for any `Fn(Event<T>)` closure; implement it directly for
/// subscribers that need to await.
#[async_trait]
pub trait Subscriber<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Handles one event.
    async fn receive(&self, event: Event<T>);
}

#[async_trait]
impl<T, F> Subscriber<T> for F
where
    T: Send + 'static,
    F: Fn(Event<T>) + Send + Sync + 'static,
{
    async fn receive(&self, event: Event<T>) {
        self(event);
    }
}

/// A logical subscription as stored by the registry, with the payload type
/// erased.
#[async_trait]
pub trait Delivery: Send + Sync {
    fn id(&self) -> Uuid;

    /// The subscriber's own filter. `None` defers to the channel's filter.
    fn filter(&self) -> Option<Arc<dyn MessageFilter>>;

    async fn deliver(&self, event: Event<Value>) -> Result<(), UnmarshalError>;
}

pub struct TypedDelivery<T, S> {
    id: Uuid,
    filter: Option<Arc<dyn MessageFilter>>,
    subscriber: S,
    _payload: PhantomData<fn() -> T>,
}

impl<T, S> TypedDelivery<T, S> {
    pub const fn new(id: Uuid, filter: Option<Arc<dyn MessageFilter>>, subscriber: S) -> Self {
        Self {
            id,
            filter,
            subscriber,
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<T, S> Delivery for TypedDelivery<T, S>
where
    T: DeserializeOwned + Send + 'static,
    S: Subscriber<T>,
{
    fn id(&self) -> Uuid {
        self.id
    }

    fn filter(&self) -> Option<Arc<dyn MessageFilter>> {
        self.filter.clone()
    }

    async fn deliver(&self, event: Event<Value>) -> Result<(), UnmarshalError> {
        let event = restore::<T>(event)?;
        self.subscriber.receive(event).await;
        Ok(())
    }
}
