//! Trait definitions for the process module.

use async_trait::async_trait;
use std::time::Duration;

use super::{Invocation, ProcessError, ProcessResult};

/// Runs one external invocation with an enforced timeout.
///
/// Implementations must kill and reap the child when the timeout elapses and
/// report it with `timed_out = true`. A non-zero exit is a successful call.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Returns the runner name for logging.
    fn name(&self) -> &str;

    /// Runs the invocation to completion or until `timeout` elapses.
    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<ProcessResult, ProcessError>;
}
