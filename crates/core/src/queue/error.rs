//! Error types for the queue module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapter::ConversionOutcome;
use crate::normalizer::ErrorKind;

/// Why a job's handle resolved without a result.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<String>,
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_error: None,
        }
    }

    /// A pending job removed by `cancel` or `clear`.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::CancelledError, ErrorKind::CancelledError.describe())
    }

    /// The queue went away before the job settled.
    pub fn abandoned() -> Self {
        Self::new(
            ErrorKind::conversion_failed(),
            "Job was dropped before it completed",
        )
    }

    /// Lifts a failed outcome into an error.
    pub fn from_outcome(outcome: &ConversionOutcome) -> Self {
        Self {
            kind: outcome
                .error_kind
                .unwrap_or_else(ErrorKind::conversion_failed),
            message: outcome.message.clone(),
            raw_error: outcome.raw_error.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::CancelledError
    }
}

/// Errors returned when submitting to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A job with this id is already tracked.
    #[error("Job already exists: {0}")]
    DuplicateJob(String),
}
