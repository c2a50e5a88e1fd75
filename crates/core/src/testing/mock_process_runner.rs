//! Mock process runner for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::process::{Invocation, ProcessError, ProcessResult, ProcessRunner};

/// Mock implementation of the ProcessRunner trait.
///
/// Never spawns anything. Provides controllable behavior for testing:
/// - Record every invocation for assertions
/// - Script the next result or spawn error
/// - Simulate slow tools, including timeouts
/// - Create the files a real tool would have written
///
/// # Example
///
/// ```rust,ignore
/// use fileforge_core::testing::MockProcessRunner;
///
/// let runner = Arc::new(MockProcessRunner::new());
/// runner.create_on_run("/tmp/out/job.pdf").await;
///
/// let ctx = ToolContext::new(ToolsConfig::default(), runner.clone());
/// let outcome = adapter.convert(&ctx, input, output, &options).await;
///
/// assert_eq!(runner.spawn_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockProcessRunner {
    /// Recorded invocations.
    invocations: Arc<RwLock<Vec<Invocation>>>,
    /// Result returned by the next run only.
    next_result: Arc<RwLock<Option<ProcessResult>>>,
    /// Result returned when nothing is scripted.
    default_result: Arc<RwLock<ProcessResult>>,
    /// If set, the next run fails to spawn with this error.
    next_error: Arc<RwLock<Option<ProcessError>>>,
    /// Files created whenever a run succeeds.
    outputs: Arc<RwLock<Vec<PathBuf>>>,
    /// Also create a file at the invocation's last argument on success.
    create_last_argument: Arc<RwLock<bool>>,
    /// Simulated run time.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessRunner {
    /// Create a runner whose runs exit 0 immediately.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            next_result: Arc::new(RwLock::new(None)),
            default_result: Arc::new(RwLock::new(ProcessResult::exited(0))),
            next_error: Arc::new(RwLock::new(None)),
            outputs: Arc::new(RwLock::new(Vec::new())),
            create_last_argument: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<Invocation> {
        self.invocations.read().await.clone()
    }

    /// Number of processes that would have been spawned.
    pub async fn spawn_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Clear recorded invocations.
    pub async fn clear_recorded(&self) {
        self.invocations.write().await.clear();
    }

    /// Script the result of the next run.
    pub async fn set_next_result(&self, result: ProcessResult) {
        *self.next_result.write().await = Some(result);
    }

    /// Set the result for every unscripted run.
    pub async fn set_default_result(&self, result: ProcessResult) {
        *self.default_result.write().await = result;
    }

    /// Make the next run fail to spawn.
    pub async fn set_next_error(&self, error: ProcessError) {
        *self.next_error.write().await = Some(error);
    }

    /// Create `path` whenever a run exits cleanly. A trailing separator
    /// creates a directory instead.
    pub async fn create_on_run(&self, path: impl AsRef<Path>) {
        self.outputs.write().await.push(path.as_ref().to_path_buf());
    }

    /// Treat the last argument of every clean run as its output file.
    pub async fn set_create_last_argument(&self, enabled: bool) {
        *self.create_last_argument.write().await = enabled;
    }

    /// Simulate tools that take `delay` to run.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    async fn write_outputs(&self, invocation: &Invocation) -> std::io::Result<()> {
        let mut paths = self.outputs.read().await.clone();
        if *self.create_last_argument.read().await {
            if let Some(last) = invocation.args.last() {
                paths.push(PathBuf::from(last));
            }
        }

        for path in paths {
            if path.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
                tokio::fs::create_dir_all(&path).await?;
                tokio::fs::write(path.join("entry.txt"), b"mock entry").await?;
                continue;
            }
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, b"mock output").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<ProcessResult, ProcessError> {
        self.invocations.write().await.push(invocation.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let delay = *self.delay.read().await;
        if delay > timeout {
            tokio::time::sleep(timeout).await;
            return Ok(ProcessResult::timeout());
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.next_result.write().await.take();
        let mut result = match scripted {
            Some(result) => result,
            None => self.default_result.read().await.clone(),
        };
        result.duration_ms = delay.as_millis() as u64;

        if result.success() {
            self.write_outputs(invocation).await?;
        }
        Ok(result)
    }
}
