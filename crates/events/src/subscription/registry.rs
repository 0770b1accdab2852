use super::subscriber::Delivery;
use crate::channel::Channel;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use uuid::Uuid;

struct TopicEntry<H> {
    handle: Arc<H>,
    subscriptions: usize,
}

/// Outcome of removing a subscription.
pub enum Removed<H> {
    /// No subscription with that id exists on the channel.
    NotFound,
    /// Removed; other subscriptions still reference the topic.
    Subscription,
    /// Removed the last subscription for the topic, releasing its handle.
    LastForTopic(Arc<H>),
}

/// The topic and channel tables.
///
/// Holds at most one handle per topic, and a handle exists exactly while at
/// least one subscription references its topic. Callers keep both maps
/// consistent by mutating them under a single write lock.
pub struct SubscriptionRegistry<H> {
    topics: HashMap<String, TopicEntry<H>>,
    channels: HashMap<Channel, Vec<Arc<dyn Delivery>>>,
}

impl<H> Default for SubscriptionRegistry<H> {
    fn default() -> Self {
        Self {
            topics: HashMap::new(),
            channels: HashMap::new(),
        }
    }
}

impl<H> SubscriptionRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription, creating the topic handle with `make` if the
    /// topic has none. Returns the handle and whether it was created.
    pub fn insert<F>(
        &mut self,
        channel: Channel,
        delivery: Arc<dyn Delivery>,
        make: F,
    ) -> (Arc<H>, bool)
    where
        F: FnOnce() -> Arc<H>,
    {
        let (handle, created) = match self.topics.entry(channel.topic().to_string()) {
            Entry::Occupied(mut entry) => {
                let entry = entry.get_mut();
                entry.subscriptions += 1;
                (Arc::clone(&entry.handle), false)
            }
            Entry::Vacant(entry) => {
                let handle = make();
                entry.insert(TopicEntry {
                    handle: Arc::clone(&handle),
                    subscriptions: 1,
                });
                (handle, true)
            }
        };

        self.channels.entry(channel).or_default().push(delivery);

        (handle, created)
    }

    pub fn remove(&mut self, channel: &Channel, id: Uuid) -> Removed<H> {
        let Some(deliveries) = self.channels.get_mut(channel) else {
            return Removed::NotFound;
        };
        let Some(index) = deliveries.iter().position(|d| d.id() == id) else {
            return Removed::NotFound;
        };

        deliveries.swap_remove(index);
        if deliveries.is_empty() {
            self.channels.remove(channel);
        }

        let Entry::Occupied(mut entry) = self.topics.entry(channel.topic().to_string()) else {
            return Removed::Subscription;
        };

        entry.get_mut().subscriptions -= 1;
        if entry.get().subscriptions == 0 {
            Removed::LastForTopic(entry.remove().handle)
        } else {
            Removed::Subscription
        }
    }

    /// Removes everything, returning the released topic handles.
    pub fn drain(&mut self) -> Vec<Arc<H>> {
        self.channels.clear();
        self.topics.drain().map(|(_, entry)| entry.handle).collect()
    }

    /// Snapshot of the subscriptions for a channel.
    pub fn subscribers(&self, channel: &Channel) -> Vec<Arc<dyn Delivery>> {
        self.channels.get(channel).cloned().unwrap_or_default()
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Whether `handle` is the handle currently registered for `topic`.
    pub fn is_current(&self, topic: &str, handle: &Arc<H>) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|entry| Arc::ptr_eq(&entry.handle, handle))
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{UnmarshalError, Value};
    use crate::event::Event;
    use crate::filter::MessageFilter;

    use async_trait::async_trait;

    struct Noop(Uuid);

    #[async_trait]
    impl Delivery for Noop {
        fn id(&self) -> Uuid {
            self.0
        }

        fn filter(&self) -> Option<Arc<dyn MessageFilter>> {
            None
        }

        async fn deliver(&self, _event: Event<Value>) -> Result<(), UnmarshalError> {
            Ok(())
        }
    }

    fn delivery() -> (Uuid, Arc<dyn Delivery>) {
        let id = Uuid::new_v4();
        (id, Arc::new(Noop(id)))
    }

    #[test]
    fn test_one_handle_per_topic() {
        let mut registry = SubscriptionRegistry::<&'static str>::new();
        let (_, a) = delivery();
        let (_, b) = delivery();
        let (_, c) = delivery();

        let (first, created) =
            registry.insert(Channel::new("sample/topic", "a"), a, || Arc::new("first"));
        assert!(created);

        let (second, created) =
            registry.insert(Channel::new("sample/topic", "b"), b, || Arc::new("second"));
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));

        let (_, created) = registry.insert(Channel::new("other", "a"), c, || Arc::new("other"));
        assert!(created);

        assert_eq!(registry.topic_count(), 2);
        assert_eq!(registry.subscription_count(), 3);
        assert!(registry.is_current("sample/topic", &first));
    }

    #[test]
    fn test_last_removal_releases_handle() {
        let mut registry = SubscriptionRegistry::<u8>::new();
        let channel = Channel::new("sample/topic", "sample-type");
        let (id_a, a) = delivery();
        let (id_b, b) = delivery();

        let (handle, _) = registry.insert(channel.clone(), a, || Arc::new(1));
        registry.insert(channel.clone(), b, || Arc::new(2));
        assert_eq!(registry.subscribers(&channel).len(), 2);

        assert!(matches!(
            registry.remove(&channel, id_a),
            Removed::Subscription
        ));
        assert!(registry.contains_topic("sample/topic"));

        match registry.remove(&channel, id_b) {
            Removed::LastForTopic(released) => assert!(Arc::ptr_eq(&released, &handle)),
            _ => panic!("expected the topic handle to be released"),
        }

        assert!(!registry.contains_topic("sample/topic"));
        assert!(!registry.is_current("sample/topic", &handle));
        assert!(registry.subscribers(&channel).is_empty());
        assert!(matches!(registry.remove(&channel, id_b), Removed::NotFound));
    }

    #[test]
    fn test_topic_shared_across_event_types() {
        let mut registry = SubscriptionRegistry::<u8>::new();
        let first = Channel::new("sample/topic", "a");
        let second = Channel::new("sample/topic", "b");
        let (id_a, a) = delivery();
        let (id_b, b) = delivery();

        registry.insert(first.clone(), a, || Arc::new(1));
        registry.insert(second.clone(), b, || Arc::new(2));

        assert!(matches!(registry.remove(&first, id_a), Removed::Subscription));
        assert!(matches!(registry.remove(&first, id_b), Removed::NotFound));
        assert!(matches!(
            registry.remove(&second, id_b),
            Removed::LastForTopic(_)
        ));
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_drain() {
        let mut registry = SubscriptionRegistry::<u8>::new();
        let (_, a) = delivery();
        let (_, b) = delivery();
        registry.insert(Channel::new("x", "e"), a, || Arc::new(1));
        registry.insert(Channel::new("y", "e"), b, || Arc::new(2));

        let released = registry.drain();
        assert_eq!(released.len(), 2);
        assert_eq!(registry.topic_count(), 0);
        assert_eq!(registry.subscription_count(), 0);
    }
}
