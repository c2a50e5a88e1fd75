//! Lifecycle notifications.
//!
//! Advisory only: the queue behaves identically with no subscribers and
//! with listeners that panic.

use serde::Serialize;
use std::sync::Arc;

use super::Job;

/// One lifecycle transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    TaskAdded { job: Job },
    TaskStarted { job: Job },
    TaskCompleted { job: Job },
    TaskFailed { job: Job },
    TaskCancelled { job: Job },
    QueueCleared { cancelled: Vec<String> },
}

impl QueueEvent {
    /// The job this event is about, if any.
    pub fn job(&self) -> Option<&Job> {
        match self {
            QueueEvent::TaskAdded { job }
            | QueueEvent::TaskStarted { job }
            | QueueEvent::TaskCompleted { job }
            | QueueEvent::TaskFailed { job }
            | QueueEvent::TaskCancelled { job } => Some(job),
            QueueEvent::QueueCleared { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::TaskAdded { .. } => "task_added",
            QueueEvent::TaskStarted { .. } => "task_started",
            QueueEvent::TaskCompleted { .. } => "task_completed",
            QueueEvent::TaskFailed { .. } => "task_failed",
            QueueEvent::TaskCancelled { .. } => "task_cancelled",
            QueueEvent::QueueCleared { .. } => "queue_cleared",
        }
    }
}

/// Callback invoked synchronously for every event.
pub type QueueListener = Arc<dyn Fn(&QueueEvent) + Send + Sync>;
