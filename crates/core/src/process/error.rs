//! Error types for the process module.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Faults raised while starting or supervising a child process.
///
/// Exit status and timeouts are reported through `ProcessResult`, never here.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be found.
    #[error("Program not found: {program}")]
    NotFound { program: PathBuf },

    /// The program exists but could not be executed.
    #[error("Permission denied executing: {program}")]
    PermissionDenied { program: PathBuf },

    /// Any other I/O failure while spawning or waiting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Maps a spawn failure to the matching variant.
    pub fn from_spawn(program: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                program: program.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_path_buf(),
            },
            _ => Self::Io(err),
        }
    }
}
