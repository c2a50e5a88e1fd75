//! Configuration for the task queue.

use serde::{Deserialize, Serialize};

/// Configuration for the task queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum jobs processing at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Finished jobs kept for lookup before the oldest are forgotten.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Capacity of the lifecycle event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_history_limit() -> usize {
    1000
}

fn default_event_capacity() -> usize {
    256
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            history_limit: default_history_limit(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl QueueConfig {
    /// Sets the concurrency limit.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Sets how many finished jobs are remembered.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}
