//! Types shared by the adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::normalizer::ErrorKind;

/// A conversion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Document,
    Video,
    Audio,
    Image,
    Table,
    Archive,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Document,
        Domain::Video,
        Domain::Audio,
        Domain::Image,
        Domain::Table,
        Domain::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Document => "document",
            Domain::Video => "video",
            Domain::Audio => "audio",
            Domain::Image => "image",
            Domain::Table => "table",
            Domain::Archive => "archive",
        }
    }

    /// Video and archive work gets the longer timeout.
    pub fn uses_extended_timeout(&self) -> bool {
        matches!(self, Domain::Video | Domain::Archive)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown domain: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// Normalized result of one adapter run.
///
/// Always a value: tool failures are reported with `success = false` and an
/// `error_kind`, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub message: String,
    /// Raw tool stderr, for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionOutcome {
    pub fn succeeded(output_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            output_path: Some(output_path.into()),
            message: message.into(),
            raw_error: None,
            error_kind: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            message: message.into(),
            raw_error: None,
            error_kind: Some(kind),
        }
    }

    /// Attaches raw diagnostics, ignoring blank text.
    pub fn with_raw_error(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if !raw.trim().is_empty() {
            self.raw_error = Some(raw);
        }
        self
    }

    /// Restores `error_kind.is_some() == !success` for outcomes built by hand.
    pub fn normalized(mut self) -> Self {
        if self.success {
            self.error_kind = None;
        } else if self.error_kind.is_none() {
            self.error_kind = Some(ErrorKind::conversion_failed());
        }
        self
    }
}
