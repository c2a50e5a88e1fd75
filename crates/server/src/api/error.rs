//! Mapping from job errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use fileforge_core::{ErrorKind, JobError};

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Machine-readable kind, e.g. `routing_error`.
    pub error: String,
    pub message: String,
    /// Tool failure detail for `tool_execution_failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                success: false,
                error: error.to_string(),
                message: message.into(),
                reason: None,
                job_id: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::ValidationError.code(),
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound.code(), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::conversion_failed().code(),
            message,
        )
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.body.job_id = Some(job_id.into());
        self
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: &ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError | ErrorKind::RoutingError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::CancelledError => StatusCode::CONFLICT,
        ErrorKind::ToolTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ToolExecutionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let reason = match err.kind {
            ErrorKind::ToolExecutionFailed(failure) => Some(failure.to_string()),
            _ => None,
        };
        let mut api = Self::new(status_for(&err.kind), err.kind.code(), err.message);
        api.body.reason = reason;
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
