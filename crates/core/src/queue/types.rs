//! Types for the queue module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::JobError;
use crate::adapter::{ConversionOptions, ConversionOutcome, Domain};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// What a caller submits.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Generated when absent.
    pub id: Option<String>,
    pub domain: Domain,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub target_format: String,
    pub options: ConversionOptions,
    /// Client-side file name, kept for display.
    pub original_name: Option<String>,
}

impl JobSpec {
    pub fn new(
        domain: Domain,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_format: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            domain,
            input_path: input_path.into(),
            output_path: output_path.into(),
            target_format: target_format.into(),
            options: ConversionOptions::default(),
            original_name: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }
}

/// A job as tracked by the queue. Callers only ever see clones.
///
/// `status` changes only through the queue's transitions, and `result` and
/// `error` are each written at most once, on the terminal transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub domain: Domain,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub target_format: String,
    pub options: ConversionOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ConversionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

impl Job {
    pub(crate) fn from_spec(spec: JobSpec) -> Self {
        Self {
            id: spec
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            domain: spec.domain,
            input_path: spec.input_path,
            output_path: spec.output_path,
            target_format: spec.target_format,
            options: spec.options,
            original_name: spec.original_name,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.status, JobStatus::Pending);
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self, outcome: ConversionOutcome) {
        debug_assert_eq!(self.status, JobStatus::Processing);
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.result.get_or_insert(outcome);
    }

    pub(crate) fn fail(&mut self, error: JobError) {
        debug_assert_eq!(self.status, JobStatus::Processing);
        self.status = JobStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error.get_or_insert(error);
    }

    pub(crate) fn cancel(&mut self, error: JobError) {
        debug_assert_eq!(self.status, JobStatus::Pending);
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.error.get_or_insert(error);
    }

    /// Wall time spent processing, once finished.
    pub fn processing_duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Pending plus processing.
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub max_concurrent: usize,
    /// Lifetime totals.
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}
