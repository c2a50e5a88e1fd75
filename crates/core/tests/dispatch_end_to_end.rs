//! Dispatch-to-adapter integration tests.
//!
//! Requests are resolved by the real dispatcher and run by the real adapters
//! against a mock process runner, so every path from routing through output
//! verification is exercised without installed tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use fileforge_core::{
    adapter::Artifact,
    process::ProcessError,
    testing::MockProcessRunner,
    ConversionOptions, Dispatcher, Domain, ErrorKind, Operation, ProcessResult, ToolContext,
    ToolFailure, ToolsConfig,
};

struct TestHarness {
    dispatcher: Dispatcher,
    runner: Arc<MockProcessRunner>,
    tools: ToolContext,
    dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_tools(ToolsConfig::default())
    }

    fn with_tools(config: ToolsConfig) -> Self {
        let runner = Arc::new(MockProcessRunner::new());
        Self {
            dispatcher: Dispatcher::default(),
            tools: ToolContext::new(config, runner.clone()),
            runner,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn upload(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("uploads").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"input bytes").unwrap();
        path
    }

    fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("outputs").join(name)
    }
}

fn only_candidate(artifact: &Artifact) -> &Path {
    match artifact {
        Artifact::File { candidates } => &candidates[0],
        Artifact::Directory => panic!("expected a file artifact"),
    }
}

#[test]
fn test_routing_scenarios() {
    let dispatcher = Dispatcher::default();

    let err = dispatcher.resolve("image", "heic", "docx").unwrap_err();
    assert_eq!(err.domain, "image");
    assert_eq!(err.input_ext, "heic");
    assert_eq!(err.target_format, "docx");

    let adapter = dispatcher.resolve("image", "png", "jpg").unwrap();
    assert_eq!(adapter.operation(), Operation::ImageConvert);
    assert_eq!(adapter.domain(), Domain::Image);

    let adapter = dispatcher.resolve("Archive", ".RAR", "extract").unwrap();
    assert_eq!(adapter.operation(), Operation::ExtractRar);
}

#[tokio::test]
async fn test_crop_without_dimensions_never_spawns() {
    let h = TestHarness::new();
    let input = h.upload("photo.png");
    let adapter = h.dispatcher.resolve("image", "png", "crop").unwrap();

    let outcome = adapter
        .convert(&h.tools, &input, &h.output("photo.png"), &ConversionOptions::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::ValidationError));
    assert_eq!(h.runner.spawn_count().await, 0);
}

#[tokio::test]
async fn test_image_convert_end_to_end() {
    let h = TestHarness::new();
    h.runner.set_create_last_argument(true).await;
    let input = h.upload("photo.png");
    let output = h.output("job-1.webp");
    let adapter = h.dispatcher.resolve("image", "png", "WEBP").unwrap();

    let outcome = adapter
        .convert(&h.tools, &input, &output, &ConversionOptions::new())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.output_path.as_deref(), Some(output.as_path()));
    assert!(outcome.error_kind.is_none());
    assert!(output.exists());

    let invocation = &h.runner.recorded_invocations().await[0];
    assert_eq!(invocation.program_name(), "magick");
    assert!(invocation.args.iter().any(|a| a == "80"));
}

#[tokio::test]
async fn test_office_output_is_renamed_from_staging() {
    let h = TestHarness::new();
    let input = h.upload("report.pdf");
    let output = h.output("job-2.docx");
    let adapter = h.dispatcher.resolve("document", "pdf", "docx").unwrap();
    assert_eq!(adapter.operation(), Operation::PdfToWord);

    let plan = adapter
        .plan(&h.tools.config, &input, &output, &ConversionOptions::new())
        .unwrap();
    let produced = only_candidate(&plan.artifact).to_path_buf();
    assert_ne!(produced, output);
    h.runner.create_on_run(&produced).await;

    let outcome = adapter
        .convert(&h.tools, &input, &output, &ConversionOptions::new())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert!(output.exists());
    assert!(!produced.exists());
    assert!(!plan.staging_dir.unwrap().exists());
}

#[tokio::test]
async fn test_clean_exit_without_output_is_missing_output() {
    let h = TestHarness::new();
    let input = h.upload("clip.wav");
    let adapter = h.dispatcher.resolve("audio", "wav", "mp3").unwrap();

    let outcome = adapter
        .convert(&h.tools, &input, &h.output("job-3.mp3"), &ConversionOptions::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error_kind,
        Some(ErrorKind::ToolExecutionFailed(ToolFailure::MissingOutput))
    );
}

#[tokio::test]
async fn test_extraction_that_writes_nothing_is_missing_output() {
    let h = TestHarness::new();
    let input = h.upload("empty.zip");
    let adapter = h.dispatcher.resolve("archive", "zip", "extract").unwrap();
    let output = h.output("job-5");

    let outcome = adapter
        .convert(&h.tools, &input, &output, &ConversionOptions::new())
        .await;

    assert_eq!(h.runner.spawn_count().await, 1);
    assert!(!outcome.success);
    assert_eq!(
        outcome.error_kind,
        Some(ErrorKind::ToolExecutionFailed(ToolFailure::MissingOutput))
    );
}

#[tokio::test]
async fn test_extraction_with_entries_succeeds() {
    let h = TestHarness::new();
    let input = h.upload("photos.zip");
    let adapter = h.dispatcher.resolve("archive", "zip", "extract").unwrap();
    let output = h.output("job-6");
    h.runner
        .create_on_run(format!("{}{}", output.display(), std::path::MAIN_SEPARATOR))
        .await;

    let outcome = adapter
        .convert(&h.tools, &input, &output, &ConversionOptions::new())
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.output_path.as_deref(), Some(output.as_path()));
    assert!(output.join("entry.txt").exists());
}

#[tokio::test]
async fn test_stderr_is_classified_and_kept() {
    let h = TestHarness::new();
    let input = h.upload("secret.zip");
    h.runner
        .set_next_result(
            ProcessResult::exited(82).with_stderr("skipping: secret.txt  incorrect password"),
        )
        .await;
    let adapter = h.dispatcher.resolve("archive", "zip", "extract").unwrap();

    let outcome = adapter
        .convert(&h.tools, &input, &h.output("job-4"), &ConversionOptions::new())
        .await;

    assert_eq!(
        outcome.error_kind,
        Some(ErrorKind::ToolExecutionFailed(ToolFailure::PasswordProtected))
    );
    assert!(outcome.raw_error.unwrap().contains("incorrect password"));
}

#[tokio::test]
async fn test_missing_binary_is_tool_unavailable() {
    let h = TestHarness::with_tools(
        ToolsConfig::default().with_ffmpeg_path("/nonexistent/bin/ffmpeg"),
    );
    h.runner
        .set_next_error(ProcessError::NotFound {
            program: PathBuf::from("/nonexistent/bin/ffmpeg"),
        })
        .await;
    let input = h.upload("movie.mkv");
    let adapter = h.dispatcher.resolve("video", "mkv", "mp4").unwrap();

    let outcome = adapter
        .convert(&h.tools, &input, &h.output("job-5.mp4"), &ConversionOptions::new())
        .await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error_kind,
        Some(ErrorKind::ToolExecutionFailed(ToolFailure::ToolUnavailable))
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_tool_times_out_with_domain_limit() {
    let h = TestHarness::with_tools(ToolsConfig::default().with_timeouts(5, 20));
    h.runner.set_delay(Duration::from_secs(10)).await;
    let input = h.upload("clip.mp3");

    // Audio uses the standard limit
    let adapter = h.dispatcher.resolve("audio", "mp3", "wav").unwrap();
    let outcome = adapter
        .convert(&h.tools, &input, &h.output("job-6.wav"), &ConversionOptions::new())
        .await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::ToolTimeout));
    assert!(outcome.message.contains("5s"));

    // Video gets the extended one and finishes
    h.runner.set_create_last_argument(true).await;
    let input = h.upload("movie.mp4");
    let adapter = h.dispatcher.resolve("video", "mp4", "webm").unwrap();
    let outcome = adapter
        .convert(&h.tools, &input, &h.output("job-7.webm"), &ConversionOptions::new())
        .await;
    assert!(outcome.success, "{}", outcome.message);
}
