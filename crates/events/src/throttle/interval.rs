use super::EventThrottler;
use crate::codec::Value;
use crate::event::Event;

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Admits at most one event per interval.
///
/// Events arriving before the interval has elapsed since the last admitted
/// event are excluded.
#[derive(Debug)]
pub struct IntervalThrottler {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl IntervalThrottler {
    /// Creates a throttler with the given minimum interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// The minimum interval between admitted events.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl EventThrottler for IntervalThrottler {
    fn is_included(&self, _event: &Event<Value>) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock();

        match *last {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_one_event_per_interval() {
        let throttler = IntervalThrottler::new(Duration::from_secs(10));
        let event = Event::new("t", "e", Value::Unit);

        assert!(throttler.is_included(&event));
        assert!(!throttler.is_included(&event));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!throttler.is_included(&event));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(throttler.is_included(&event));
        assert!(!throttler.is_included(&event));
    }
}
