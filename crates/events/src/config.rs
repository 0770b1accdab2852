//! Event service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the publisher and subscription services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Upper bound on a single transport connect
    pub connect_timeout: Duration,

    /// Upper bound on a single subscribe attempt
    pub subscribe_timeout: Duration,

    /// Upper bound on a single publish
    pub publish_timeout: Duration,

    /// Delay before a failed subscribe is attempted again
    pub retry_delay: Duration,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            subscribe_timeout: Duration::from_secs(3),
            publish_timeout: Duration::from_secs(3),
            retry_delay: Duration::from_secs(30),
        }
    }
}
