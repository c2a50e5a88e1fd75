//! Awaitable job handles.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use super::JobError;
use crate::adapter::ConversionOutcome;

pub(crate) type JobResult = Result<ConversionOutcome, JobError>;

/// Resolves when the job settles: the outcome on completion, the error on
/// failure or cancellation.
///
/// Dropping the handle does not cancel the job.
#[derive(Debug)]
pub struct JobHandle {
    id: String,
    rx: oneshot::Receiver<JobResult>,
}

impl JobHandle {
    pub(crate) fn new(id: String, rx: oneshot::Receiver<JobResult>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for JobHandle {
    type Output = JobResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(JobError::abandoned())))
    }
}
