//! Conversion API handler.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use fileforge_core::{ConversionOptions, ConversionRequest};

use super::error::ApiError;
use super::jobs::download_url;
use super::upload::upload_path;
use crate::state::AppState;

/// Request body for the convert and job endpoints
#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    /// Stored name returned by the upload endpoint.
    pub file_name: String,
    pub target_format: String,
    #[serde(default)]
    pub options: ConversionOptions,
    /// Client-side name, for display.
    #[serde(default)]
    pub original_name: Option<String>,
}

/// Response for a finished conversion
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
    pub file_name: String,
    pub download_url: String,
    /// Entries of an extracted archive, relative to `file_name`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

pub(super) fn conversion_request(
    state: &AppState,
    domain: String,
    body: ConvertBody,
) -> Result<ConversionRequest, ApiError> {
    let input_path = upload_path(state.upload_dir(), &body.file_name)?;
    let mut request = ConversionRequest::new(domain, input_path, body.target_format)
        .with_options(body.options);
    request.original_name = body.original_name;
    Ok(request)
}

/// Convert an uploaded file and wait for the result
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Json(body): Json<ConvertBody>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let request = conversion_request(&state, domain, body)?;
    let handle = state.service().submit(request).await?;
    let job_id = handle.id().to_string();

    let outcome = handle
        .await
        .map_err(|e| ApiError::from(e).with_job_id(job_id.clone()))?;

    let output = outcome
        .output_path
        .ok_or_else(|| ApiError::internal("Conversion reported no output").with_job_id(&job_id))?;
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let files = if output.is_dir() {
        list_files(output).await
    } else {
        Vec::new()
    };

    Ok(Json(ConvertResponse {
        success: true,
        message: outcome.message,
        job_id,
        download_url: download_url(&file_name),
        file_name,
        files,
    }))
}

/// Relative paths of every file below `root`, sorted.
async fn list_files(root: PathBuf) -> Vec<String> {
    let mut files = Vec::new();
    let mut stack = vec![root.clone()];

    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot list extracted files");
                continue;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            match entry.file_type().await {
                Ok(t) if t.is_dir() => stack.push(path),
                Ok(_) => {
                    if let Ok(relative) = path.strip_prefix(&root) {
                        files.push(relative.to_string_lossy().replace('\\', "/"));
                    }
                }
                Err(_) => {}
            }
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files_is_recursive_and_relative() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/inner")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("docs/inner/b.txt"), b"b").unwrap();

        let files = list_files(dir.path().to_path_buf()).await;
        assert_eq!(files, vec!["a.txt", "docs/inner/b.txt"]);
    }

    #[test]
    fn test_body_options_default_to_empty() {
        let body: ConvertBody =
            serde_json::from_str(r#"{"file_name":"a.png","target_format":"jpg"}"#).unwrap();
        assert!(body.options.is_empty());
        assert!(body.original_name.is_none());
    }
}
