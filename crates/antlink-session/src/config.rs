use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of decoded messages buffered for the consumer.
pub const DEFAULT_INBOUND_CAPACITY: usize = 32;

/// Session tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Decoded messages held for the consumer before new ones are dropped.
    /// `0` makes the hand-off a strict rendezvous with a blocked receiver.
    pub inbound_capacity: usize,
    /// Sleep after a read that produced nothing. `0` only yields the thread.
    pub idle_backoff_micros: u64,
    /// Prefix for the names of the pump and decoder threads.
    pub thread_name: String,
}

impl SessionConfig {
    /// Idle backoff as a duration, `None` when the pump should only yield.
    pub fn idle_backoff(&self) -> Option<Duration> {
        (self.idle_backoff_micros > 0).then(|| Duration::from_micros(self.idle_backoff_micros))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            idle_backoff_micros: 0,
            thread_name: "antlink".to_string(),
        }
    }
}
