//! Throttlers decide which outbound events are handed to the transport.

mod interval;

pub use interval::IntervalThrottler;

use crate::codec::Value;
use crate::event::Event;

use std::fmt::{self, Debug};

/// A predicate over outbound events.
pub trait EventThrottler: Debug + Send + Sync + 'static {
    /// Returns whether the event should be published.
    fn is_included(&self, event: &Event<Value>) -> bool;
}

/// Publishes every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct IncludeAll;

impl EventThrottler for IncludeAll {
    fn is_included(&self, _event: &Event<Value>) -> bool {
        true
    }
}

/// Publishes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExcludeAll;

impl EventThrottler for ExcludeAll {
    fn is_included(&self, _event: &Event<Value>) -> bool {
        false
    }
}

/// A throttler backed by a closure.
pub struct PredicateThrottler<F> {
    name: &'static str,
    predicate: F,
}

impl<F> PredicateThrottler<F>
where
    F: Fn(&Event<Value>) -> bool + Send + Sync + 'static,
{
    /// Creates a named throttler from a closure. The name is used in logs.
    pub const fn new(name: &'static str, predicate: F) -> Self {
        Self { name, predicate }
    }
}

impl<F> Debug for PredicateThrottler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateThrottler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> EventThrottler for PredicateThrottler<F>
where
    F: Fn(&Event<Value>) -> bool + Send + Sync + 'static,
{
    fn is_included(&self, event: &Event<Value>) -> bool {
        (self.predicate)(event)
    }
}
