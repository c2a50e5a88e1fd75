//! Job and queue API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use fileforge_core::{Domain, ErrorKind, Job, JobStatus, QueueStatus};

use super::convert::{conversion_request, ConvertBody};
use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Error details of a failed or cancelled job
#[derive(Debug, Clone, Serialize)]
pub struct JobErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A job as shown to clients. Server paths are reduced to file names.
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub domain: Domain,
    pub target_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorBody>,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        let file_name = job
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let download_url =
            (job.status == JobStatus::Completed).then(|| download_url(&file_name));

        Self {
            id: job.id.clone(),
            domain: job.domain,
            target_format: job.target_format.clone(),
            original_name: job.original_name.clone(),
            status: job.status,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            file_name,
            download_url,
            error: job.error.as_ref().map(|e| JobErrorBody {
                error: e.kind.code().to_string(),
                message: e.message.clone(),
                reason: match e.kind {
                    ErrorKind::ToolExecutionFailed(failure) => Some(failure.to_string()),
                    _ => None,
                },
            }),
        }
    }
}

/// Response for an accepted background job
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response for cancelling a job
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub cancelled: bool,
}

/// Queue occupancy with the ids in each state
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    #[serde(flatten)]
    pub status: QueueStatus,
    pub pending_jobs: Vec<String>,
    pub processing_jobs: Vec<String>,
}

/// Response for clearing the queue
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cancelled: Vec<String>,
}

pub fn download_url(file_name: &str) -> String {
    format!("/api/v1/download/{}", file_name)
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a conversion without waiting for it
///
/// Shares its route with the id-keyed handlers, so the segment is the domain.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Json(body): Json<ConvertBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let request = conversion_request(&state, domain, body)?;
    let handle = state.service().submit(request).await?;
    let job_id = handle.id().to_string();
    // The handle is not awaited; the result stays available via GET
    drop(handle);

    let status = state
        .service()
        .queue()
        .job(&job_id)
        .map(|j| j.status)
        .unwrap_or(JobStatus::Pending);
    info!(job_id = %job_id, "Accepted background job");

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id, status })))
}

/// Get a job by id
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .service()
        .queue()
        .job(&id)
        .map(|job| Json(JobResponse::from(&job)))
        .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", id)))
}

/// Cancel a pending job
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let queue = state.service().queue();
    if queue.cancel(&id) {
        return Ok(Json(CancelResponse {
            job_id: id,
            cancelled: true,
        }));
    }

    match queue.job(&id) {
        Some(job) => Err(ApiError::new(
            StatusCode::CONFLICT,
            "not_cancellable",
            format!("Job is {} and can no longer be cancelled", job.status.as_str()),
        )
        .with_job_id(id)),
        None => Err(ApiError::not_found(format!("Job not found: {}", id))),
    }
}

/// Queue status
pub async fn queue_status(State(state): State<Arc<AppState>>) -> Json<QueueResponse> {
    let queue = state.service().queue();
    Json(QueueResponse {
        status: queue.status(),
        pending_jobs: queue.pending_jobs().into_iter().map(|j| j.id).collect(),
        processing_jobs: queue.processing_jobs().into_iter().map(|j| j.id).collect(),
    })
}

/// Cancel every pending job
pub async fn clear_queue(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    let cancelled = state.service().queue().clear();
    Json(ClearResponse {
        cancelled: cancelled.into_iter().map(|j| j.id).collect(),
    })
}
