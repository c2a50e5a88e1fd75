//! The shared failure taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a conversion job did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Options or request fields failed validation.
    ValidationError,
    /// No adapter handles the requested domain/format pair.
    RoutingError,
    /// The input file was absent at submission.
    NotFound,
    /// The tool exceeded its wall-clock limit and was killed.
    ToolTimeout,
    /// The tool ran but did not produce a usable result.
    ToolExecutionFailed(ToolFailure),
    /// The job was cancelled before it started.
    CancelledError,
}

/// Refinement of [`ErrorKind::ToolExecutionFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailure {
    CorruptedInput,
    PasswordProtected,
    UnsupportedFormat,
    MissingDecoder,
    PermissionDenied,
    OutOfMemory,
    InputMissing,
    /// The tool exited cleanly but the declared output does not exist.
    MissingOutput,
    /// The tool binary could not be started.
    ToolUnavailable,
    ConversionFailed,
}

impl ErrorKind {
    /// Shorthand for the generic tool failure.
    pub const fn conversion_failed() -> Self {
        Self::ToolExecutionFailed(ToolFailure::ConversionFailed)
    }

    /// Stable machine code for the top-level kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::RoutingError => "routing_error",
            Self::NotFound => "not_found",
            Self::ToolTimeout => "tool_timeout",
            Self::ToolExecutionFailed(_) => "tool_execution_failed",
            Self::CancelledError => "cancelled",
        }
    }

    /// Human-readable explanation suitable for end users.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::ValidationError => "The request options are invalid",
            Self::RoutingError => "This conversion is not supported",
            Self::NotFound => "The file does not exist or has been removed",
            Self::ToolTimeout => "The conversion timed out, try a smaller file",
            Self::ToolExecutionFailed(failure) => failure.describe(),
            Self::CancelledError => "Task cancelled",
        }
    }
}

impl ToolFailure {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CorruptedInput => "The file is corrupted, please upload it again",
            Self::PasswordProtected => "Password protected files are not supported",
            Self::UnsupportedFormat => "The file format is not supported",
            Self::MissingDecoder => "No decoder is available for this file",
            Self::PermissionDenied => "Insufficient permissions to access the file",
            Self::OutOfMemory => "Out of memory, try a smaller file",
            Self::InputMissing => "The file does not exist",
            Self::MissingOutput => "The converter did not produce an output file",
            Self::ToolUnavailable => "The conversion tool is not available",
            Self::ConversionFailed => {
                "Conversion failed, check that the file is intact and the format is supported"
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolExecutionFailed(failure) => write!(f, "{}:{}", self.code(), failure),
            _ => f.write_str(self.code()),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CorruptedInput => "corrupted_input",
            Self::PasswordProtected => "password_protected",
            Self::UnsupportedFormat => "unsupported_format",
            Self::MissingDecoder => "missing_decoder",
            Self::PermissionDenied => "permission_denied",
            Self::OutOfMemory => "out_of_memory",
            Self::InputMissing => "input_missing",
            Self::MissingOutput => "missing_output",
            Self::ToolUnavailable => "tool_unavailable",
            Self::ConversionFailed => "conversion_failed",
        };
        f.write_str(s)
    }
}
