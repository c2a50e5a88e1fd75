//! A fully built tool invocation plus where its output will appear.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::process::Invocation;

/// What the adapter expects the tool to leave behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A single file, found at the first existing candidate and then moved
    /// to the requested output path.
    File { candidates: Vec<PathBuf> },
    /// A directory at the requested output path (archive extraction).
    Directory,
}

/// One planned invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPlan {
    pub invocation: Invocation,
    pub artifact: Artifact,
    /// Private output directory for tools that choose their own file names.
    /// Created before the run and removed afterwards.
    pub staging_dir: Option<PathBuf>,
}

impl ToolPlan {
    /// A tool that writes exactly the requested output file.
    pub fn writes(invocation: Invocation, output: &Path) -> Self {
        Self {
            invocation,
            artifact: Artifact::File {
                candidates: vec![output.to_path_buf()],
            },
            staging_dir: None,
        }
    }

    /// A tool whose output may land at any of `candidates`.
    pub fn writes_one_of(invocation: Invocation, candidates: Vec<PathBuf>) -> Self {
        Self {
            invocation,
            artifact: Artifact::File { candidates },
            staging_dir: None,
        }
    }

    /// A tool that populates the output directory.
    pub fn fills_directory(invocation: Invocation) -> Self {
        Self {
            invocation,
            artifact: Artifact::Directory,
            staging_dir: None,
        }
    }

    pub fn with_staging_dir(mut self, dir: PathBuf) -> Self {
        self.staging_dir = Some(dir);
        self
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Output not found after conversion: {0}")]
    Missing(PathBuf),

    #[error("Failed to move output into place: {0}")]
    Io(#[from] std::io::Error),
}

/// Confirms the tool produced its output and moves it to `output`.
///
/// Candidates are checked in order; the first regular file wins. Existence of
/// the output is the success signal, regardless of exit status. A directory
/// output is created before the run, so it only counts once it has an entry.
pub async fn finalize(artifact: &Artifact, output: &Path) -> Result<PathBuf, ArtifactError> {
    match artifact {
        Artifact::Directory => {
            if has_entries(output).await {
                Ok(output.to_path_buf())
            } else {
                Err(ArtifactError::Missing(output.to_path_buf()))
            }
        }
        Artifact::File { candidates } => {
            for candidate in candidates {
                let is_file = tokio::fs::metadata(candidate)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if !is_file {
                    continue;
                }
                if candidate != output {
                    debug!(from = %candidate.display(), to = %output.display(), "Renaming tool output");
                    tokio::fs::rename(candidate, output).await?;
                }
                return Ok(output.to_path_buf());
            }
            Err(ArtifactError::Missing(output.to_path_buf()))
        }
    }
}

async fn has_entries(dir: &Path) -> bool {
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

/// Removes a staging directory, logging instead of failing.
pub async fn discard_staging(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %e, "Failed to remove staging directory");
        }
    }
}
