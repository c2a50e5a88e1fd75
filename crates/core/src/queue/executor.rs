//! The production executor: dispatch, then run the adapter.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Job, JobExecutor};
use crate::adapter::{extension_of, ConversionOutcome, ToolContext};
use crate::dispatcher::Dispatcher;
use crate::normalizer::ErrorKind;

/// Resolves each job's adapter and runs it against the real tools.
///
/// Routing is normally checked before submission, so a routing failure here
/// only happens when a job is submitted to the queue directly.
#[derive(Debug, Clone)]
pub struct DispatchExecutor {
    dispatcher: Arc<Dispatcher>,
    tools: ToolContext,
}

impl DispatchExecutor {
    pub fn new(dispatcher: Arc<Dispatcher>, tools: ToolContext) -> Self {
        Self { dispatcher, tools }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn tools(&self) -> &ToolContext {
        &self.tools
    }
}

#[async_trait]
impl JobExecutor for DispatchExecutor {
    async fn execute(&self, job: &Job) -> ConversionOutcome {
        let input_ext = extension_of(&job.input_path);
        let adapter = match self
            .dispatcher
            .resolve_in(job.domain, &input_ext, &job.target_format)
        {
            Ok(adapter) => adapter,
            Err(e) => return ConversionOutcome::failed(ErrorKind::RoutingError, e.to_string()),
        };

        if !tokio::fs::try_exists(&job.input_path).await.unwrap_or(false) {
            return ConversionOutcome::failed(
                ErrorKind::NotFound,
                format!("Input file not found: {}", job.input_path.display()),
            );
        }

        adapter
            .convert(&self.tools, &job.input_path, &job.output_path, &job.options)
            .await
    }
}
