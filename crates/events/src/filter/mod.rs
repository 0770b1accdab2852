//! Filters decide which subscribers receive an inbound message.
//!
//! A filter sees the raw transport message after channel routing and before
//! the payload is decoded for a particular subscriber.

mod error;
mod json;

pub use error::FilterError;
pub use json::JsonPointerFilter;

use crate::event::Message;

use std::fmt::{self, Debug};

/// A predicate over inbound messages.
pub trait MessageFilter: Debug + Send + Sync + 'static {
    /// Returns whether the message is relevant to the subscriber.
    ///
    /// # Errors
    /// Returns an error if the message cannot be evaluated. Callers treat an
    /// error as a rejection.
    fn is_included(&self, message: &Message) -> Result<bool, FilterError>;
}

/// Accepts every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl MessageFilter for AcceptAll {
    fn is_included(&self, _message: &Message) -> Result<bool, FilterError> {
        Ok(true)
    }
}

/// Rejects every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectAll;

impl MessageFilter for RejectAll {
    fn is_included(&self, _message: &Message) -> Result<bool, FilterError> {
        Ok(false)
    }
}

/// A filter backed by a closure.
pub struct PredicateFilter<F> {
    name: &'static str,
    predicate: F,
}

impl<F> PredicateFilter<F>
where
    F: Fn(&Message) -> bool + Send + Sync + 'static,
{
    /// Creates a named filter from a closure. The name is used in logs.
    pub const fn new(name: &'static str, predicate: F) -> Self {
        Self { name, predicate }
    }
}

impl<F> Debug for PredicateFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> MessageFilter for PredicateFilter<F>
where
    F: Fn(&Message) -> bool + Send + Sync + 'static,
{
    fn is_included(&self, message: &Message) -> Result<bool, FilterError> {
        Ok((self.predicate)(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::QoS;

    #[test]
    fn test_builtin_filters() {
        let message = Message::new("t", QoS::AtMostOnce, "anything");

        assert_eq!(AcceptAll.is_included(&message), Ok(true));
        assert_eq!(RejectAll.is_included(&message), Ok(false));
    }

    #[test]
    fn test_predicate_filter() {
        let filter = PredicateFilter::new("short", |m: &Message| m.payload.len() < 5);

        assert_eq!(
            filter.is_included(&Message::new("t", QoS::AtMostOnce, "abc")),
            Ok(true)
        );
        assert_eq!(
            filter.is_included(&Message::new("t", QoS::AtMostOnce, "abcdef")),
            Ok(false)
        );
        assert!(format!("{filter:?}").contains("short"));
    }
}
