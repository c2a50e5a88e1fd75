//! Trait definitions for the queue module.

use async_trait::async_trait;

use super::Job;
use crate::adapter::ConversionOutcome;

/// Performs the work for one admitted job.
///
/// Must not panic for expected failures; report them as an unsuccessful
/// outcome. The queue still survives a panic, failing only that job.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    async fn execute(&self, job: &Job) -> ConversionOutcome;
}
