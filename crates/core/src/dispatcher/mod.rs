//! Format dispatch.
//!
//! Resolves `(domain, input extension, target)` to an [`Adapter`] using one
//! static [`RoutingTable`]. Resolution is pure: nothing touches the
//! filesystem or spawns a process, so unsupported requests are rejected
//! before any work starts.

mod error;
mod table;

pub use error::{RoutingError, TableError};
pub use table::{RoutingEntry, RoutingTable};

use tracing::debug;

use crate::adapter::{Adapter, Domain};
use crate::metrics;

/// Selects the adapter for a request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: RoutingTable,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RoutingTable::builtin())
    }
}

fn normalize(token: &str) -> String {
    token.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl Dispatcher {
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Resolves a request whose domain is still a raw string.
    ///
    /// Case-insensitive; a leading dot on the extension is ignored. An
    /// unknown domain is a routing error like any unsupported pair.
    pub fn resolve(
        &self,
        domain: &str,
        input_ext: &str,
        target_format: &str,
    ) -> Result<Adapter, RoutingError> {
        match domain.parse::<Domain>() {
            Ok(domain) => self.resolve_in(domain, input_ext, target_format),
            Err(_) => Err(self.reject(&normalize(domain), input_ext, target_format)),
        }
    }

    pub fn resolve_in(
        &self,
        domain: Domain,
        input_ext: &str,
        target_format: &str,
    ) -> Result<Adapter, RoutingError> {
        let ext = normalize(input_ext);
        let target = normalize(target_format);

        match self.table.lookup(domain, &ext, &target) {
            Some((operation, canonical_target)) => {
                Ok(Adapter::new(domain, operation, canonical_target))
            }
            None => Err(self.reject(domain.as_str(), input_ext, target_format)),
        }
    }

    /// Targets available for an input, for client hints.
    pub fn supported_targets(&self, domain: Domain, input_ext: &str) -> Vec<&'static str> {
        self.table.targets_for(domain, &normalize(input_ext))
    }

    fn reject(&self, domain: &str, input_ext: &str, target_format: &str) -> RoutingError {
        let error = RoutingError {
            domain: domain.to_string(),
            input_ext: normalize(input_ext),
            target_format: normalize(target_format),
        };
        debug!(
            domain = %error.domain,
            input_ext = %error.input_ext,
            target_format = %error.target_format,
            "Rejected unsupported conversion"
        );
        metrics::ROUTING_REJECTIONS
            .with_label_values(&[metric_domain(domain)])
            .inc();
        error
    }
}

/// Keeps label cardinality bounded when clients send arbitrary domains.
fn metric_domain(domain: &str) -> &'static str {
    domain
        .parse::<Domain>()
        .map(|d| d.as_str())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Operation;

    #[test]
    fn test_resolve_image_convert() {
        let dispatcher = Dispatcher::default();
        let adapter = dispatcher.resolve("image", "png", "jpg").unwrap();
        assert_eq!(adapter.domain(), Domain::Image);
        assert_eq!(adapter.operation(), Operation::ImageConvert);
        assert_eq!(adapter.target_format(), "jpg");
    }

    #[test]
    fn test_resolve_heic_to_docx_is_routing_error() {
        let dispatcher = Dispatcher::default();
        let err = dispatcher.resolve("image", "heic", "docx").unwrap_err();
        assert_eq!(
            err,
            RoutingError {
                domain: "image".into(),
                input_ext: "heic".into(),
                target_format: "docx".into(),
            }
        );
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_ignores_dot() {
        let dispatcher = Dispatcher::default();
        let adapter = dispatcher.resolve("Video", ".MP4", "GIF").unwrap();
        assert_eq!(adapter.operation(), Operation::VideoToGif);
        assert_eq!(adapter.target_format(), "gif");
    }

    #[test]
    fn test_unknown_domain_is_routing_error() {
        let dispatcher = Dispatcher::default();
        let err = dispatcher.resolve("hologram", "png", "jpg").unwrap_err();
        assert_eq!(err.domain, "hologram");
    }

    #[test]
    fn test_two_tier_dispatch() {
        let dispatcher = Dispatcher::default();
        let op = |d: &str, e: &str, t: &str| dispatcher.resolve(d, e, t).unwrap().operation();

        assert_eq!(op("image", "jpg", "compress"), Operation::ImageCompress);
        assert_eq!(op("image", "jpg", "watermark"), Operation::ImageWatermark);
        assert_eq!(op("audio", "flac", "cut"), Operation::AudioCut);
        assert_eq!(op("audio", "flac", "mp3"), Operation::AudioTranscode);
        assert_eq!(op("video", "mkv", "mp3"), Operation::AudioExtract);
        assert_eq!(op("document", "pdf", "docx"), Operation::PdfToWord);
        assert_eq!(op("document", "pdf", "txt"), Operation::PdfToText);
        assert_eq!(op("document", "docx", "txt"), Operation::OfficeConvert);
        assert_eq!(op("table", "csv", "json"), Operation::CsvToJson);
    }

    #[test]
    fn test_archive_extract_branches_on_container() {
        let dispatcher = Dispatcher::default();
        let op = |e: &str| dispatcher.resolve("archive", e, "extract").unwrap().operation();

        assert_eq!(op("zip"), Operation::ExtractZip);
        assert_eq!(op("rar"), Operation::ExtractRar);
        assert_eq!(op("7z"), Operation::Extract7z);
        assert!(dispatcher.resolve("archive", "tar", "extract").is_err());
    }

    #[test]
    fn test_domain_scoping() {
        let dispatcher = Dispatcher::default();
        // csv -> json only exists for tables
        assert!(dispatcher.resolve("document", "csv", "json").is_err());
        // gif is a video input, not an image input
        assert!(dispatcher.resolve("image", "gif", "png").is_err());
    }

    #[test]
    fn test_supported_targets() {
        let dispatcher = Dispatcher::default();
        let targets = dispatcher.supported_targets(Domain::Audio, ".WAV");
        assert_eq!(
            targets,
            vec!["cut", "denoise", "flac", "m4a", "mp3", "ogg", "volume"]
        );
    }
}
