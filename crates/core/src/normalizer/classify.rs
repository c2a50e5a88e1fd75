//! Stderr pattern tables per tool family.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::{ErrorKind, ToolFailure};
use crate::adapter::Domain;

/// Which family of tools produced the stderr being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFamily {
    /// LibreOffice, ebook-convert, pdftotext and friends.
    Document,
    /// ffmpeg and gifsicle.
    Media,
    /// ImageMagick.
    Image,
    /// unzip, unrar, 7z, zip.
    Archive,
}

impl ToolFamily {
    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::Document | Domain::Table => Self::Document,
            Domain::Video | Domain::Audio => Self::Media,
            Domain::Image => Self::Image,
            Domain::Archive => Self::Archive,
        }
    }

    fn patterns(&self) -> &'static [(Regex, ErrorKind)] {
        match self {
            Self::Document => &DOCUMENT_PATTERNS,
            Self::Media => &MEDIA_PATTERNS,
            Self::Image => &IMAGE_PATTERNS,
            Self::Archive => &ARCHIVE_PATTERNS,
        }
    }
}

type PatternTable = Lazy<Vec<(Regex, ErrorKind)>>;

fn compile(table: &[(&str, ErrorKind)]) -> Vec<(Regex, ErrorKind)> {
    table
        .iter()
        .map(|(pattern, kind)| (Regex::new(pattern).unwrap(), *kind))
        .collect()
}

const fn failed(failure: ToolFailure) -> ErrorKind {
    ErrorKind::ToolExecutionFailed(failure)
}

static DOCUMENT_PATTERNS: PatternTable = Lazy::new(|| {
    compile(&[
        (r"Error loading document", failed(ToolFailure::CorruptedInput)),
        (r"Timeout", ErrorKind::ToolTimeout),
        (r"Unsupported format", failed(ToolFailure::UnsupportedFormat)),
        (r"Password", failed(ToolFailure::PasswordProtected)),
        (r"Syntax Error|May not be a PDF file", failed(ToolFailure::CorruptedInput)),
    ])
});

static MEDIA_PATTERNS: PatternTable = Lazy::new(|| {
    compile(&[
        (
            r"Invalid data found when processing input",
            failed(ToolFailure::CorruptedInput),
        ),
        (r"Error while decoding stream", failed(ToolFailure::CorruptedInput)),
        (
            r"Unknown encoder|Decoder \S+ not found|Unknown decoder",
            failed(ToolFailure::MissingDecoder),
        ),
        (r"Conversion failed", failed(ToolFailure::ConversionFailed)),
        (r"No such file or directory", failed(ToolFailure::InputMissing)),
        (r"Permission denied", failed(ToolFailure::PermissionDenied)),
        (r"Timeout", ErrorKind::ToolTimeout),
    ])
});

static IMAGE_PATTERNS: PatternTable = Lazy::new(|| {
    compile(&[
        (
            r"unrecognized image format",
            failed(ToolFailure::UnsupportedFormat),
        ),
        (
            r"no decode delegate for this image format",
            failed(ToolFailure::MissingDecoder),
        ),
        (r"corrupt image", failed(ToolFailure::CorruptedInput)),
        (r"No such file or directory", failed(ToolFailure::InputMissing)),
        (r"Permission denied", failed(ToolFailure::PermissionDenied)),
    ])
});

static ARCHIVE_PATTERNS: PatternTable = Lazy::new(|| {
    compile(&[
        (r"(?i)password", failed(ToolFailure::PasswordProtected)),
        (
            r"End-of-central-directory signature not found|is not RAR archive|Headers Error|CRC Failed",
            failed(ToolFailure::CorruptedInput),
        ),
        (
            r"Can not open the file as archive|Unsupported method",
            failed(ToolFailure::UnsupportedFormat),
        ),
        (
            r"No such file or directory|cannot find or open",
            failed(ToolFailure::InputMissing),
        ),
        (r"Permission denied", failed(ToolFailure::PermissionDenied)),
    ])
});

/// Checked after the family table, for any tool.
static GENERIC_PATTERNS: PatternTable = Lazy::new(|| {
    compile(&[
        (r"ENOENT", failed(ToolFailure::InputMissing)),
        (r"EACCES", failed(ToolFailure::PermissionDenied)),
        (
            r"(?i)out of memory|Cannot allocate memory|MemoryAllocationFailed",
            failed(ToolFailure::OutOfMemory),
        ),
    ])
});

/// Classifies tool stderr for `domain` into the shared taxonomy.
///
/// The first matching pattern of the domain's family wins, then the generic
/// table; anything else is `ToolExecutionFailed(ConversionFailed)`.
pub fn classify(domain: Domain, stderr: &str) -> ErrorKind {
    ToolFamily::for_domain(domain)
        .patterns()
        .iter()
        .chain(GENERIC_PATTERNS.iter())
        .find(|(re, _)| re.is_match(stderr))
        .map(|(_, kind)| *kind)
        .unwrap_or_else(ErrorKind::conversion_failed)
}
