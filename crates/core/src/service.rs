//! Conversion service: dispatcher and queue behind one entry point.
//!
//! Everything that can be rejected without running a tool is rejected here,
//! before the job takes a queue slot: unsupported routes, missing inputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::adapter::{extension_of, ConversionOptions, ConversionOutcome, ToolContext};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::normalizer::ErrorKind;
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::queue::{DispatchExecutor, JobError, JobExecutor, JobHandle, JobSpec, TaskQueue};

/// A conversion as requested by a client.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Raw domain name, validated during routing.
    pub domain: String,
    pub input_path: PathBuf,
    pub target_format: String,
    pub options: ConversionOptions,
    pub original_name: Option<String>,
}

impl ConversionRequest {
    pub fn new(
        domain: impl Into<String>,
        input_path: impl Into<PathBuf>,
        target_format: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            input_path: input_path.into(),
            target_format: target_format.into(),
            options: ConversionOptions::default(),
            original_name: None,
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }
}

/// Routes requests, names their outputs and feeds them to the queue.
pub struct ConversionService<E: JobExecutor = DispatchExecutor> {
    dispatcher: Arc<Dispatcher>,
    queue: TaskQueue<E>,
    output_dir: PathBuf,
}

impl<E: JobExecutor> Clone for ConversionService<E> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            queue: self.queue.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

impl ConversionService<DispatchExecutor> {
    /// Service running the real tools.
    pub fn from_config(config: &Config) -> Self {
        Self::with_runner(config, Arc::new(TokioProcessRunner::new()))
    }

    /// Service running tools through the given runner.
    pub fn with_runner(config: &Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let dispatcher = Arc::new(Dispatcher::default());
        let executor = DispatchExecutor::new(
            Arc::clone(&dispatcher),
            ToolContext::new(config.tools.clone(), runner),
        );
        let queue = TaskQueue::new(config.queue.clone(), Arc::new(executor));
        Self::new(dispatcher, queue, config.storage.output_dir.clone())
    }
}

impl<E: JobExecutor> ConversionService<E> {
    pub fn new(dispatcher: Arc<Dispatcher>, queue: TaskQueue<E>, output_dir: PathBuf) -> Self {
        Self {
            dispatcher,
            queue,
            output_dir,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn queue(&self) -> &TaskQueue<E> {
        &self.queue
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Validates a request and turns it into a job spec.
    ///
    /// The job id is a fresh UUID and the output is `<output_dir>/<id>.<ext>`,
    /// so concurrent jobs never share a path.
    pub async fn prepare(&self, request: ConversionRequest) -> Result<JobSpec, JobError> {
        let input_ext = extension_of(&request.input_path);
        let adapter = self
            .dispatcher
            .resolve(&request.domain, &input_ext, &request.target_format)
            .map_err(|e| JobError::new(ErrorKind::RoutingError, e.to_string()))?;

        let input_exists = tokio::fs::metadata(&request.input_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !input_exists {
            let shown = match &request.original_name {
                Some(name) => name.clone(),
                None => request.input_path.display().to_string(),
            };
            return Err(JobError::new(
                ErrorKind::NotFound,
                format!("Input file not found: {}", shown),
            ));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                JobError::new(
                    ErrorKind::conversion_failed(),
                    format!("Cannot create output directory: {}", e),
                )
            })?;

        let id = uuid::Uuid::new_v4().to_string();
        let output_path = self.output_dir.join(adapter.output_name(&id, &input_ext));
        debug!(job_id = %id, output = %output_path.display(), "Prepared conversion");

        let mut spec = JobSpec::new(
            adapter.domain(),
            request.input_path,
            output_path,
            adapter.target_format(),
        )
        .with_id(id)
        .with_options(request.options);
        spec.original_name = request.original_name;
        Ok(spec)
    }

    /// Validates and enqueues a request without waiting for it.
    pub async fn submit(&self, request: ConversionRequest) -> Result<JobHandle, JobError> {
        let spec = self.prepare(request).await?;
        self.queue
            .submit(spec)
            .map_err(|e| JobError::new(ErrorKind::ValidationError, e.to_string()))
    }

    /// Validates, enqueues and waits for a request.
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutcome, JobError> {
        self.submit(request).await?.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{JobStatus, QueueConfig};
    use crate::testing::MockProcessRunner;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        runner: Arc<MockProcessRunner>,
        service: ConversionService,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.output_dir = dir.path().join("outputs");
        config.queue = QueueConfig::default().with_max_concurrent(2);

        let runner = Arc::new(MockProcessRunner::new());
        let service = ConversionService::with_runner(&config, runner.clone());
        Fixture {
            dir,
            runner,
            service,
        }
    }

    fn input(fixture: &Fixture, name: &str) -> PathBuf {
        let path = fixture.dir.path().join(name);
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[tokio::test]
    async fn test_unsupported_route_never_queues() {
        let f = fixture();
        let path = input(&f, "a.heic");

        let err = f
            .service
            .submit(ConversionRequest::new("image", path, "docx"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RoutingError);
        assert_eq!(f.service.queue().status().total, 0);
    }

    #[tokio::test]
    async fn test_unknown_domain_is_routing_error() {
        let f = fixture();
        let path = input(&f, "a.png");

        let err = f
            .service
            .prepare(ConversionRequest::new("hologram", path, "jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RoutingError);
    }

    #[tokio::test]
    async fn test_missing_input_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .prepare(
                ConversionRequest::new("image", f.dir.path().join("nope.png"), "jpg")
                    .with_original_name("holiday.png"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("holiday.png"));
    }

    #[tokio::test]
    async fn test_prepare_names_output_after_job_id() {
        let f = fixture();
        let path = input(&f, "clip.WAV");

        let spec = f
            .service
            .prepare(
                ConversionRequest::new("AUDIO", path, "cut")
                    .with_options(ConversionOptions::new().with("start", 1)),
            )
            .await
            .unwrap();

        let id = spec.id.clone().unwrap();
        assert_eq!(
            spec.output_path,
            f.dir.path().join("outputs").join(format!("{}.wav", id))
        );
        assert!(f.dir.path().join("outputs").is_dir());
    }

    #[tokio::test]
    async fn test_convert_runs_through_queue() {
        let f = fixture();
        f.runner.set_create_last_argument(true).await;
        let path = input(&f, "photo.png");

        let outcome = f
            .service
            .convert(ConversionRequest::new("image", path, "webp"))
            .await
            .unwrap();

        assert!(outcome.success);
        let output = outcome.output_path.unwrap();
        assert!(output.exists());
        assert_eq!(output.extension().unwrap(), "webp");

        let status = f.service.queue().status();
        assert_eq!(status.completed, 1);
        assert_eq!(status.total, 0);
        assert_eq!(f.runner.spawn_count().await, 1);
    }

    #[tokio::test]
    async fn test_submit_returns_handle_for_job() {
        let f = fixture();
        f.runner.set_create_last_argument(true).await;
        let path = input(&f, "photo.png");

        let handle = f
            .service
            .submit(ConversionRequest::new("image", path, "jpg"))
            .await
            .unwrap();
        let id = handle.id().to_string();
        handle.await.unwrap();

        let job = f.service.queue().job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }
}
