//! [`StatusPublisher`] – best-effort status output.
//!
//! A failed write is logged and dropped. It is never retried: the next
//! write to the same channel supersedes it anyway.

use tagsense_middleware::{StatusChannel, StatusSink};
use tagsense_types::{ProximityState, StatusToken};
use tracing::{debug, warn};

/// Wraps a [`StatusSink`] so that write failures can never stop the loop.
pub struct StatusPublisher {
    sink: Box<dyn StatusSink>,
    failures: u64,
}

impl StatusPublisher {
    pub fn new(sink: Box<dyn StatusSink>) -> Self {
        Self { sink, failures: 0 }
    }

    /// Write `value` to `channel`. Returns `false` if the write failed.
    pub fn publish(&mut self, channel: StatusChannel, value: &str) -> bool {
        match self.sink.write(channel, value) {
            Ok(()) => {
                debug!(channel = %channel, value, "status published");
                true
            }
            Err(e) => {
                self.failures += 1;
                warn!(channel = %channel, value, error = %e, "status write failed; continuing");
                false
            }
        }
    }

    pub fn publish_token(&mut self, channel: StatusChannel, token: StatusToken) -> bool {
        self.publish(channel, &token.to_string())
    }

    pub fn publish_actuator(&mut self, state: ProximityState) -> bool {
        self.publish(StatusChannel::Actuator, state.as_status())
    }

    /// Number of writes that have failed since construction.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsense_middleware::MemoryChannels;

    #[test]
    fn publishes_tokens_and_actuator_literals() {
        let channels = MemoryChannels::new();
        let mut publisher = StatusPublisher::new(Box::new(channels.clone()));

        assert!(publisher.publish_actuator(ProximityState::Close));
        assert!(publisher.publish_token(StatusChannel::Forward, StatusToken::Numeric(42.0)));
        assert!(publisher.publish_token(StatusChannel::Forward, StatusToken::Entered2));

        assert_eq!(channels.values(StatusChannel::Actuator), vec!["ON"]);
        assert_eq!(channels.values(StatusChannel::Forward), vec!["42.0", "entered2"]);
    }

    #[test]
    fn write_failures_are_counted_not_raised() {
        let channels = MemoryChannels::new();
        channels.fail_writes(true);
        let mut publisher = StatusPublisher::new(Box::new(channels.clone()));

        assert!(!publisher.publish_actuator(ProximityState::Far));
        assert!(!publisher.publish(StatusChannel::Lateral, "1.0"));
        assert_eq!(publisher.failures(), 2);

        channels.fail_writes(false);
        assert!(publisher.publish(StatusChannel::Lateral, "2.0"));
        assert_eq!(channels.values(StatusChannel::Lateral), vec!["2.0"]);
    }
}
