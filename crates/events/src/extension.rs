//! Registries mapping channels to capability overrides with a shared default.
//!
//! Marshallers, unmarshallers, filters and throttlers are all looked up the
//! same way: an override registered for the exact channel wins, otherwise the
//! registry's default is returned. Lookups clone an `Arc` out of the map so
//! no shard lock is held while the capability runs.

use crate::channel::Channel;

use std::fmt::Debug;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

/// Channel-keyed overrides of a capability `V`.
#[derive(Debug)]
pub struct ExtensionRegistry<V: ?Sized> {
    kind: &'static str,
    default: Arc<V>,
    overrides: DashMap<Channel, Arc<V>>,
}

impl<V> ExtensionRegistry<V>
where
    V: Debug + Send + Sync + ?Sized,
{
    /// Creates an empty registry. `kind` names the capability in logs.
    pub fn new(kind: &'static str, default: Arc<V>) -> Self {
        Self {
            kind,
            default,
            overrides: DashMap::new(),
        }
    }

    /// Installs an override for a channel, returning the one it replaced.
    pub fn register(&self, channel: Channel, value: Arc<V>) -> Option<Arc<V>> {
        let previous = self.overrides.insert(channel.clone(), Arc::clone(&value));

        match &previous {
            Some(old) => info!(
                "{} for {} changed from {:?} to {:?}",
                self.kind, channel, old, value
            ),
            None => debug!("registered {} {:?} for {}", self.kind, value, channel),
        }

        previous
    }

    /// Removes the override for a channel so lookups fall back to the default.
    pub fn unregister(&self, channel: &Channel) -> Option<Arc<V>> {
        let removed = self.overrides.remove(channel).map(|(_, value)| value);

        if let Some(value) = &removed {
            debug!("unregistered {} {:?} for {}", self.kind, value, channel);
        }

        removed
    }

    /// The override for a channel, or the default.
    pub fn get(&self, channel: &Channel) -> Arc<V> {
        self.overrides.get(channel).map_or_else(
            || Arc::clone(&self.default),
            |entry| Arc::clone(entry.value()),
        )
    }

    /// The default used for channels without an override.
    pub fn default_value(&self) -> Arc<V> {
        Arc::clone(&self.default)
    }
}
