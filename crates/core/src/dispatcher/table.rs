//! The static routing table.

use std::collections::{BTreeSet, HashMap};

use super::TableError;
use crate::adapter::{Domain, Operation};

/// `(domain, input extensions, target) -> operation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    pub domain: Domain,
    pub input_extensions: Vec<&'static str>,
    pub target_format: &'static str,
    pub operation: Operation,
}

impl RoutingEntry {
    pub fn new(
        domain: Domain,
        input_extensions: &[&'static str],
        target_format: &'static str,
        operation: Operation,
    ) -> Self {
        Self {
            domain,
            input_extensions: input_extensions.to_vec(),
            target_format,
            operation,
        }
    }
}

type RouteKey = (Domain, String, String);

/// Immutable lookup built once from a list of entries.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
    routes: HashMap<RouteKey, (Operation, &'static str)>,
}

impl RoutingTable {
    /// Builds a table, rejecting duplicates, empty extension sets and
    /// operations routed from a domain they do not serve.
    pub fn new(entries: Vec<RoutingEntry>) -> Result<Self, TableError> {
        let mut routes = HashMap::new();

        for entry in &entries {
            if entry.input_extensions.is_empty() {
                return Err(TableError::EmptyInputSet {
                    domain: entry.domain,
                    target_format: entry.target_format.to_string(),
                });
            }
            if !entry.operation.domains().contains(&entry.domain) {
                return Err(TableError::DomainMismatch {
                    domain: entry.domain,
                    operation: entry.operation,
                });
            }
            for ext in &entry.input_extensions {
                let key = (
                    entry.domain,
                    ext.to_ascii_lowercase(),
                    entry.target_format.to_ascii_lowercase(),
                );
                if routes.contains_key(&key) {
                    return Err(TableError::Duplicate {
                        domain: entry.domain,
                        input_ext: key.1,
                        target_format: key.2,
                    });
                }
                routes.insert(key, (entry.operation, entry.target_format));
            }
        }

        Ok(Self { entries, routes })
    }

    /// The routes the broker ships with.
    pub fn builtin() -> Self {
        // A broken built-in table is a programming error
        Self::new(builtin_entries()).expect("built-in routing table is valid")
    }

    pub fn lookup(
        &self,
        domain: Domain,
        input_ext: &str,
        target_format: &str,
    ) -> Option<(Operation, &'static str)> {
        self.routes
            .get(&(domain, input_ext.to_string(), target_format.to_string()))
            .copied()
    }

    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Targets reachable from `input_ext` in `domain`, sorted.
    pub fn targets_for(&self, domain: Domain, input_ext: &str) -> Vec<&'static str> {
        let targets: BTreeSet<&'static str> = self
            .entries
            .iter()
            .filter(|e| e.domain == domain && e.input_extensions.iter().any(|i| *i == input_ext))
            .map(|e| e.target_format)
            .collect();
        targets.into_iter().collect()
    }

    /// Input extensions accepted by `domain`, sorted.
    pub fn inputs_for(&self, domain: Domain) -> Vec<&'static str> {
        let inputs: BTreeSet<&'static str> = self
            .entries
            .iter()
            .filter(|e| e.domain == domain)
            .flat_map(|e| e.input_extensions.iter().copied())
            .collect();
        inputs.into_iter().collect()
    }
}

const VIDEO_CONTAINERS: &[&str] = &["mp4", "avi", "mkv", "mov", "flv", "webm"];
const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg"];
const IMAGE_INPUTS: &[&str] = &["heic", "png", "jpg", "jpeg", "webp", "bmp", "tiff"];
const IMAGE_TARGETS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "pdf"];
const EBOOK_INPUTS: &[&str] = &["epub", "mobi", "azw3", "txt", "rtf"];
const EBOOK_TARGETS: &[&str] = &["epub", "mobi", "azw3", "pdf", "txt", "rtf", "docx"];

/// One entry per target for a group of inputs.
fn fan_out(
    domain: Domain,
    inputs: &[&'static str],
    targets: &[&'static str],
    operation: Operation,
) -> Vec<RoutingEntry> {
    targets
        .iter()
        .map(|&target| RoutingEntry::new(domain, inputs, target, operation))
        .collect()
}

/// Every input to every other format of the same family.
fn reformat_among(
    domain: Domain,
    inputs: &[&'static str],
    targets: &[&'static str],
    operation: Operation,
) -> Vec<RoutingEntry> {
    targets
        .iter()
        .filter_map(|&target| {
            let sources: Vec<&'static str> =
                inputs.iter().copied().filter(|i| *i != target).collect();
            (!sources.is_empty()).then(|| RoutingEntry::new(domain, &sources, target, operation))
        })
        .collect()
}

fn builtin_entries() -> Vec<RoutingEntry> {
    use Domain::*;
    use Operation::*;

    let mut entries = Vec::new();

    // Documents
    entries.extend(fan_out(Document, &["pdf"], &["doc", "docx"], PdfToWord));
    entries.extend(fan_out(
        Document,
        &["pdf"],
        &["xls", "xlsx", "ppt", "pptx"],
        OfficeConvert,
    ));
    entries.extend(fan_out(Document, &["pdf"], &["jpg", "png"], PdfToImage));
    entries.push(RoutingEntry::new(Document, &["pdf"], "txt", PdfToText));
    entries.extend(fan_out(
        Document,
        &["doc", "docx"],
        &["pdf", "txt", "rtf"],
        OfficeConvert,
    ));
    entries.extend(fan_out(
        Document,
        &["xls", "xlsx"],
        &["pdf", "csv", "html"],
        OfficeConvert,
    ));
    entries.extend(fan_out(
        Document,
        &["ppt", "pptx"],
        &["pdf", "jpg", "png"],
        OfficeConvert,
    ));
    entries.extend(reformat_among(
        Document,
        EBOOK_INPUTS,
        EBOOK_TARGETS,
        EbookConvert,
    ));

    // Tables
    entries.extend(fan_out(
        Table,
        &["xlsx", "xls", "csv"],
        &["csv", "html", "pdf"],
        OfficeConvert,
    ));
    entries.push(RoutingEntry::new(Table, &["csv"], "json", CsvToJson));

    // Video
    entries.extend(reformat_among(
        Video,
        VIDEO_CONTAINERS,
        VIDEO_CONTAINERS,
        VideoTranscode,
    ));
    entries.extend(fan_out(
        Video,
        VIDEO_CONTAINERS,
        &["mp3", "aac", "wav"],
        AudioExtract,
    ));
    entries.push(RoutingEntry::new(Video, VIDEO_CONTAINERS, "gif", VideoToGif));
    entries.push(RoutingEntry::new(Video, &["gif"], "mp4", GifToVideo));
    entries.push(RoutingEntry::new(Video, &["gif"], "gif", GifOptimize));

    // Audio
    entries.extend(reformat_among(
        Audio,
        AUDIO_FORMATS,
        AUDIO_FORMATS,
        AudioTranscode,
    ));
    entries.push(RoutingEntry::new(Audio, AUDIO_FORMATS, "cut", AudioCut));
    entries.push(RoutingEntry::new(Audio, AUDIO_FORMATS, "denoise", AudioDenoise));
    entries.push(RoutingEntry::new(Audio, AUDIO_FORMATS, "volume", AudioVolume));

    // Images
    entries.extend(fan_out(Image, IMAGE_INPUTS, IMAGE_TARGETS, ImageConvert));
    entries.push(RoutingEntry::new(Image, IMAGE_INPUTS, "compress", ImageCompress));
    entries.push(RoutingEntry::new(Image, IMAGE_INPUTS, "crop", ImageCrop));
    entries.push(RoutingEntry::new(Image, IMAGE_INPUTS, "rotate", ImageRotate));
    entries.push(RoutingEntry::new(Image, IMAGE_INPUTS, "watermark", ImageWatermark));

    // Archives
    entries.push(RoutingEntry::new(Archive, &["zip"], "extract", ExtractZip));
    entries.push(RoutingEntry::new(Archive, &["rar"], "extract", ExtractRar));
    entries.push(RoutingEntry::new(Archive, &["7z"], "extract", Extract7z));
    entries.push(RoutingEntry::new(Archive, &["zip", "rar", "7z"], "zip", ZipCompress));

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_builds() {
        let table = RoutingTable::builtin();
        assert!(!table.is_empty());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let err = RoutingTable::new(vec![
            RoutingEntry::new(Domain::Image, &["png"], "jpg", Operation::ImageConvert),
            RoutingEntry::new(Domain::Image, &["gif", "PNG"], "jpg", Operation::ImageConvert),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::Duplicate { ref input_ext, .. } if input_ext == "png"));
    }

    #[test]
    fn test_empty_input_set_rejected() {
        let err = RoutingTable::new(vec![RoutingEntry::new(
            Domain::Audio,
            &[],
            "mp3",
            Operation::AudioTranscode,
        )])
        .unwrap_err();
        assert!(matches!(err, TableError::EmptyInputSet { .. }));
    }

    #[test]
    fn test_operation_domain_mismatch_rejected() {
        let err = RoutingTable::new(vec![RoutingEntry::new(
            Domain::Audio,
            &["png"],
            "jpg",
            Operation::ImageConvert,
        )])
        .unwrap_err();
        assert_eq!(
            err,
            TableError::DomainMismatch {
                domain: Domain::Audio,
                operation: Operation::ImageConvert
            }
        );
    }

    #[test]
    fn test_same_format_reformat_is_not_routed() {
        let table = RoutingTable::builtin();
        assert!(table.lookup(Domain::Video, "mp4", "mp4").is_none());
        assert!(table.lookup(Domain::Audio, "wav", "wav").is_none());
        assert!(table.lookup(Domain::Document, "epub", "epub").is_none());
        assert_eq!(
            table.lookup(Domain::Video, "gif", "gif").map(|r| r.0),
            Some(Operation::GifOptimize)
        );
    }

    #[test]
    fn test_targets_for() {
        let table = RoutingTable::builtin();
        assert_eq!(
            table.targets_for(Domain::Archive, "zip"),
            vec!["extract", "zip"]
        );
        assert_eq!(
            table.targets_for(Domain::Table, "csv"),
            vec!["csv", "html", "json", "pdf"]
        );
    }

    #[test]
    fn test_inputs_for() {
        let table = RoutingTable::builtin();
        assert_eq!(table.inputs_for(Domain::Archive), vec!["7z", "rar", "zip"]);
    }
}
