//! External tool adapters.
//!
//! An [`Adapter`] turns one (domain, operation, target) request into exactly
//! one external invocation, runs it through the process shim and folds the
//! result into a [`ConversionOutcome`]. Adapters never return errors: option
//! validation, spawn failures, timeouts and missing outputs all come back as
//! `success = false` outcomes with an [`ErrorKind`].
//!
//! The output file's existence is the authoritative success signal. Tools
//! that pick their own output name are run against a candidate list and the
//! first hit is renamed to the requested path.

mod archive;
mod config;
mod document;
mod image;
mod media;
mod options;
mod plan;
mod table;
mod types;

pub use config::ToolsConfig;
pub use options::{
    CompressMode, CompressParams, ConversionOptions, CropParams, CutParams, OptionsError,
    RotateParams, VolumeParams, WatermarkParams, WatermarkPosition,
};
pub use plan::{Artifact, ToolPlan};
pub use types::{ConversionOutcome, Domain, UnknownDomain};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::normalizer::{classify, ErrorKind, ToolFailure};
use crate::process::{ProcessError, ProcessRunner, TokioProcessRunner};

/// Every distinct tool operation the broker knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // Documents and tables
    OfficeConvert,
    PdfToWord,
    PdfToImage,
    PdfToText,
    EbookConvert,
    CsvToJson,
    // Video
    VideoTranscode,
    AudioExtract,
    VideoToGif,
    GifToVideo,
    GifOptimize,
    // Audio
    AudioTranscode,
    AudioCut,
    AudioDenoise,
    AudioVolume,
    // Images
    ImageConvert,
    ImageCompress,
    ImageCrop,
    ImageRotate,
    ImageWatermark,
    // Archives
    ExtractZip,
    ExtractRar,
    Extract7z,
    ZipCompress,
}

impl Operation {
    /// Domains this operation may be routed from.
    pub fn domains(&self) -> &'static [Domain] {
        use Operation::*;
        match self {
            OfficeConvert => &[Domain::Document, Domain::Table],
            PdfToWord | PdfToImage | PdfToText | EbookConvert => &[Domain::Document],
            CsvToJson => &[Domain::Table],
            VideoTranscode | AudioExtract | VideoToGif | GifToVideo | GifOptimize => {
                &[Domain::Video]
            }
            AudioTranscode | AudioCut | AudioDenoise | AudioVolume => &[Domain::Audio],
            ImageConvert | ImageCompress | ImageCrop | ImageRotate | ImageWatermark => {
                &[Domain::Image]
            }
            ExtractZip | ExtractRar | Extract7z | ZipCompress => &[Domain::Archive],
        }
    }

    /// Operations that edit a file in place keep the input's extension.
    pub fn keeps_input_format(&self) -> bool {
        matches!(
            self,
            Operation::ImageCompress
                | Operation::ImageCrop
                | Operation::ImageRotate
                | Operation::ImageWatermark
                | Operation::AudioCut
                | Operation::AudioDenoise
                | Operation::AudioVolume
        )
    }

    /// Extraction produces a directory rather than a file.
    pub fn produces_directory(&self) -> bool {
        matches!(
            self,
            Operation::ExtractZip | Operation::ExtractRar | Operation::Extract7z
        )
    }
}

/// Everything an adapter needs to run: tool locations and a process runner.
#[derive(Clone)]
pub struct ToolContext {
    pub config: ToolsConfig,
    pub runner: Arc<dyn ProcessRunner>,
}

impl ToolContext {
    pub fn new(config: ToolsConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    /// Uses the real tokio process runner.
    pub fn with_default_runner(config: ToolsConfig) -> Self {
        Self::new(config, Arc::new(TokioProcessRunner::new()))
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("config", &self.config)
            .field("runner", &self.runner.name())
            .finish()
    }
}

/// A resolved route: one operation applied within one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adapter {
    domain: Domain,
    operation: Operation,
    target_format: &'static str,
}

impl Adapter {
    pub fn new(domain: Domain, operation: Operation, target_format: &'static str) -> Self {
        Self {
            domain,
            operation,
            target_format,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn target_format(&self) -> &'static str {
        self.target_format
    }

    /// Output file name for a job, given the input's extension.
    pub fn output_name(&self, stem: &str, input_ext: &str) -> String {
        if self.operation.produces_directory() {
            stem.to_string()
        } else if self.operation == Operation::GifOptimize {
            format!("{}.gif", stem)
        } else if self.operation.keeps_input_format() {
            format!("{}.{}", stem, input_ext.trim_start_matches('.').to_ascii_lowercase())
        } else {
            format!("{}.{}", stem, self.target_format)
        }
    }

    /// Builds the invocation without running it. Fails only on bad options.
    pub fn plan(
        &self,
        tools: &ToolsConfig,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
    ) -> Result<ToolPlan, OptionsError> {
        let target = self.target_format;
        let plan = match self.operation {
            Operation::OfficeConvert => document::office_convert(tools, input, output, target, None),
            Operation::PdfToWord => document::pdf_to_word(tools, input, output, target),
            Operation::PdfToImage => document::pdf_to_image(tools, input, output, target),
            Operation::PdfToText => document::pdf_to_text(tools, input, output),
            Operation::EbookConvert => document::ebook_convert(tools, input, output),
            Operation::CsvToJson => table::csv_to_json(tools, input, output),
            Operation::VideoTranscode => media::video_transcode(tools, input, output, target),
            Operation::AudioExtract => media::audio_extract(tools, input, output, target),
            Operation::VideoToGif => media::video_to_gif(tools, input, output),
            Operation::GifToVideo => media::gif_to_video(tools, input, output),
            Operation::GifOptimize => media::gif_optimize(tools, input, output),
            Operation::AudioTranscode => media::audio_transcode(tools, input, output, target),
            Operation::AudioCut => media::audio_cut(tools, input, output, options)?,
            Operation::AudioDenoise => media::audio_denoise(tools, input, output),
            Operation::AudioVolume => media::audio_volume(tools, input, output, options)?,
            Operation::ImageConvert => image::image_convert(tools, input, output, target),
            Operation::ImageCompress => image::image_compress(tools, input, output, options)?,
            Operation::ImageCrop => image::image_crop(tools, input, output, options)?,
            Operation::ImageRotate => image::image_rotate(tools, input, output, options)?,
            Operation::ImageWatermark => image::image_watermark(tools, input, output, options)?,
            Operation::ExtractZip => archive::extract_zip(tools, input, output),
            Operation::ExtractRar => archive::extract_rar(tools, input, output),
            Operation::Extract7z => archive::extract_7z(tools, input, output),
            Operation::ZipCompress => archive::zip_compress(tools, input, output),
        };
        Ok(plan)
    }

    /// Runs the conversion. Never fails; every problem becomes an outcome.
    pub async fn convert(
        &self,
        ctx: &ToolContext,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
    ) -> ConversionOutcome {
        let plan = match self.plan(&ctx.config, input, output, options) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(operation = ?self.operation, error = %e, "Rejected options");
                return ConversionOutcome::failed(ErrorKind::ValidationError, e.to_string());
            }
        };

        if let Err(e) = prepare_output(&plan, output).await {
            warn!(output = %output.display(), error = %e, "Failed to prepare output location");
            let failure = if e.kind() == std::io::ErrorKind::PermissionDenied {
                ToolFailure::PermissionDenied
            } else {
                ToolFailure::ConversionFailed
            };
            return ConversionOutcome::failed(
                ErrorKind::ToolExecutionFailed(failure),
                format!("Cannot prepare output location: {}", e),
            );
        }

        let outcome = self.execute(ctx, &plan, output).await;

        if let Some(staging) = &plan.staging_dir {
            plan::discard_staging(staging).await;
        }
        outcome
    }

    async fn execute(&self, ctx: &ToolContext, plan: &ToolPlan, output: &Path) -> ConversionOutcome {
        let timeout = ctx.config.timeout_for(self.domain);
        let program = plan.invocation.program_name();

        let result = match ctx.runner.run(&plan.invocation, timeout).await {
            Ok(result) => result,
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to start tool");
                metrics::TOOL_INVOCATIONS
                    .with_label_values(&[program.as_str(), "spawn_error"])
                    .inc();
                let failure = match e {
                    ProcessError::PermissionDenied { .. } => ToolFailure::PermissionDenied,
                    ProcessError::NotFound { .. } | ProcessError::Io(_) => {
                        ToolFailure::ToolUnavailable
                    }
                };
                return ConversionOutcome::failed(
                    ErrorKind::ToolExecutionFailed(failure),
                    format!("{}: {}", failure.describe(), e),
                );
            }
        };

        if result.timed_out {
            metrics::TOOL_INVOCATIONS
                .with_label_values(&[program.as_str(), "timeout"])
                .inc();
            metrics::TOOL_TIMEOUTS
                .with_label_values(&[self.domain.as_str()])
                .inc();
            return ConversionOutcome::failed(
                ErrorKind::ToolTimeout,
                format!(
                    "{} ({} exceeded {}s)",
                    ErrorKind::ToolTimeout.describe(),
                    program,
                    timeout.as_secs()
                ),
            )
            .with_raw_error(result.stderr);
        }

        if !result.success() {
            metrics::TOOL_INVOCATIONS
                .with_label_values(&[program.as_str(), "failed"])
                .inc();
            let kind = classify(self.domain, &result.stderr);
            info!(
                program = %program,
                exit_code = ?result.exit_code,
                kind = %kind,
                "Tool reported failure"
            );
            let raw = if result.stderr.trim().is_empty() {
                format!("{} exited with code {:?}", program, result.exit_code)
            } else {
                result.stderr
            };
            return ConversionOutcome::failed(kind, kind.describe()).with_raw_error(raw);
        }

        metrics::TOOL_INVOCATIONS
            .with_label_values(&[program.as_str(), "ok"])
            .inc();

        match plan::finalize(&plan.artifact, output).await {
            Ok(path) => ConversionOutcome::succeeded(path, "Conversion succeeded"),
            Err(plan::ArtifactError::Missing(path)) => {
                warn!(program = %program, expected = %path.display(), "Tool exited cleanly without output");
                let kind = ErrorKind::ToolExecutionFailed(ToolFailure::MissingOutput);
                ConversionOutcome::failed(kind, kind.describe()).with_raw_error(result.stderr)
            }
            Err(e) => ConversionOutcome::failed(ErrorKind::conversion_failed(), e.to_string()),
        }
    }
}

async fn prepare_output(plan: &ToolPlan, output: &Path) -> std::io::Result<()> {
    match plan.artifact {
        Artifact::Directory => tokio::fs::create_dir_all(output).await?,
        Artifact::File { .. } => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }
    if let Some(staging) = &plan.staging_dir {
        tokio::fs::create_dir_all(staging).await?;
    }
    Ok(())
}

/// File name without its final extension.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lower-cased extension without the dot.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Hidden per-output working directory next to the output.
pub(crate) fn staging_dir_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!(".{}.staging", name))
}
