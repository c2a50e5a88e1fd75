//! Upload API handler.
//!
//! Files are stored under a fresh UUID name that keeps the lower-cased
//! extension, so the dispatcher can route on it and names never collide.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use fileforge_core::ErrorKind;

use super::error::ApiError;
use crate::metrics::{UPLOADS_TOTAL, UPLOAD_BYTES};
use crate::state::AppState;

/// Response for a stored upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Name to pass to the convert endpoints.
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
}

/// Store the multipart `file` field
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("Uploaded file has no name"))?;
        let extension = extension_of(&original_name)
            .ok_or_else(|| ApiError::bad_request("Uploaded file has no extension"))?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let path = state.upload_dir().join(&file_name);

        tokio::fs::create_dir_all(state.upload_dir())
            .await
            .map_err(|e| ApiError::internal(format!("Cannot create upload directory: {}", e)))?;
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Cannot store upload: {}", e)))?;

        let mut size = 0u64;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    discard(&path).await;
                    return Err(multipart_error(e));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                discard(&path).await;
                return Err(ApiError::internal(format!("Cannot store upload: {}", e)));
            }
            size += chunk.len() as u64;
        }
        if let Err(e) = file.flush().await {
            discard(&path).await;
            return Err(ApiError::internal(format!("Cannot store upload: {}", e)));
        }

        UPLOADS_TOTAL.inc();
        UPLOAD_BYTES.inc_by(size);
        info!(file_name = %file_name, original_name = %original_name, size, "Stored upload");

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                file_name,
                original_name,
                size,
            }),
        ));
    }

    Err(ApiError::bad_request("Missing multipart field: file"))
}

/// Resolves an uploaded file name to its stored path.
///
/// Only bare names produced by the upload endpoint are accepted.
pub fn upload_path(upload_dir: &Path, file_name: &str) -> Result<PathBuf, ApiError> {
    let bare = !file_name.is_empty()
        && !file_name.starts_with('.')
        && !file_name.contains(['/', '\\'])
        && !file_name.contains("..");
    if !bare {
        return Err(ApiError::bad_request(format!(
            "Invalid file name: {}",
            file_name
        )));
    }
    Ok(upload_dir.join(file_name))
}

fn extension_of(name: &str) -> Option<String> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let valid = !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(extension)
}

/// Keeps axum's status, which is 413 when the body limit is hit.
fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(
        err.status(),
        ErrorKind::ValidationError.code(),
        format!("Invalid upload: {}", err.body_text()),
    )
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Holiday.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("archive.tar.7z").as_deref(), Some("7z"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("weird.j p g"), None);
    }

    #[test]
    fn test_upload_path_rejects_traversal() {
        let dir = Path::new("/srv/uploads");
        assert!(upload_path(dir, "abc.png").is_ok());
        assert!(upload_path(dir, "../etc/passwd").is_err());
        assert!(upload_path(dir, "a/b.png").is_err());
        assert!(upload_path(dir, ".hidden").is_err());
        assert!(upload_path(dir, "").is_err());
    }
}
