//! Mock job executor for queue tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::adapter::ConversionOutcome;
use crate::normalizer::ErrorKind;
use crate::queue::{Job, JobExecutor};

/// What a scripted job does once it has waited out its delay.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Succeed with the job's output path.
    Succeed,
    /// Fail with the given kind.
    Fail(ErrorKind),
    /// Panic inside the executor.
    Panic,
}

#[derive(Debug, Clone)]
struct Script {
    delay: Duration,
    outcome: ScriptedOutcome,
}

/// Mock implementation of the JobExecutor trait.
///
/// Jobs are scripted by id: how long they take and how they end. Unscripted
/// jobs use the default delay and succeed. Start order is recorded so tests
/// can check admission order.
#[derive(Debug)]
pub struct MockExecutor {
    scripts: Arc<RwLock<HashMap<String, Script>>>,
    default_delay: Arc<RwLock<Duration>>,
    started: Arc<RwLock<Vec<String>>>,
    finished: Arc<RwLock<Vec<String>>>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(Duration::ZERO)),
            started: Arc::new(RwLock::new(Vec::new())),
            finished: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Script one job.
    pub async fn script(&self, job_id: &str, delay: Duration, outcome: ScriptedOutcome) {
        self.scripts
            .write()
            .await
            .insert(job_id.to_string(), Script { delay, outcome });
    }

    /// Delay used by unscripted jobs.
    pub async fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.write().await = delay;
    }

    /// Ids of jobs in the order the executor was invoked.
    pub async fn started_order(&self) -> Vec<String> {
        self.started.read().await.clone()
    }

    /// Ids of jobs in the order they returned.
    pub async fn finished_order(&self) -> Vec<String> {
        self.finished.read().await.clone()
    }

    /// Total executor invocations.
    pub async fn execution_count(&self) -> usize {
        self.started.read().await.len()
    }
}

#[async_trait]
impl JobExecutor for MockExecutor {
    async fn execute(&self, job: &Job) -> ConversionOutcome {
        self.started.write().await.push(job.id.clone());

        let script = self.scripts.read().await.get(&job.id).cloned();
        let script = match script {
            Some(script) => script,
            None => Script {
                delay: *self.default_delay.read().await,
                outcome: ScriptedOutcome::Succeed,
            },
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        self.finished.write().await.push(job.id.clone());

        match script.outcome {
            ScriptedOutcome::Succeed => {
                ConversionOutcome::succeeded(job.output_path.clone(), "mock conversion")
            }
            ScriptedOutcome::Fail(kind) => {
                ConversionOutcome::failed(kind, kind.describe()).with_raw_error("mock stderr")
            }
            ScriptedOutcome::Panic => panic!("mock executor panic for {}", job.id),
        }
    }
}
