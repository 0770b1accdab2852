//! MQTT-style topics.
//!
//! Topics are `/`-separated levels. Topic filters may additionally use:
//! - `+` which matches exactly one level
//! - `#` which matches the parent level and any number of levels below it
//!   (must be the last level)

use thiserror::Error;

/// Errors that can occur when validating topics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    /// Topic is empty.
    #[error("topic cannot be empty")]
    Empty,

    /// Topic contains a NUL character.
    #[error("topic cannot contain NUL characters")]
    Nul,

    /// Wildcards are not allowed in a concrete topic.
    #[error("topic cannot contain wildcards")]
    ContainsWildcards,

    /// A wildcard is used incorrectly.
    #[error("invalid wildcard usage: {0}")]
    InvalidWildcard(&'static str),
}

/// Validates a concrete topic that events can be published to.
///
/// # Errors
/// Returns an error if the topic is empty, contains a NUL or contains wildcards.
pub fn validate_topic(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }

    if topic.contains('\0') {
        return Err(TopicError::Nul);
    }

    if topic.contains(['+', '#']) {
        return Err(TopicError::ContainsWildcards);
    }

    Ok(())
}

/// Validates a topic filter that can be subscribed to.
///
/// # Errors
/// Returns an error if the filter is empty, contains a NUL or misuses a wildcard.
pub fn validate_topic_filter(filter: &str) -> Result<(), TopicError> {
    if filter.is_empty() {
        return Err(TopicError::Empty);
    }

    if filter.contains('\0') {
        return Err(TopicError::Nul);
    }

    let levels: Vec<&str> = filter.split('/').collect();
    for (i, level) in levels.iter().enumerate() {
        match *level {
            "#" => {
                if i != levels.len() - 1 {
                    return Err(TopicError::InvalidWildcard("'#' must be the last level"));
                }
            }
            "+" => {}
            _ => {
                if level.contains(['+', '#']) {
                    return Err(TopicError::InvalidWildcard(
                        "wildcards must occupy an entire level",
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Check if a concrete topic matches a topic filter.
#[must_use]
pub fn topic_matches_filter(topic: &str, filter: &str) -> bool {
    let topic_levels: Vec<&str> = topic.split('/').collect();
    let filter_levels: Vec<&str> = filter.split('/').collect();

    let mut ti = 0;
    let mut fi = 0;

    while fi < filter_levels.len() {
        match filter_levels[fi] {
            "#" => return true,
            "+" => {
                if ti >= topic_levels.len() {
                    return false;
                }
            }
            level => {
                if ti >= topic_levels.len() || topic_levels[ti] != level {
                    return false;
                }
            }
        }
        ti += 1;
        fi += 1;
    }

    ti == topic_levels.len()
}
