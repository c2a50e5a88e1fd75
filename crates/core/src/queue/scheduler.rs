//! The bounded-concurrency FIFO scheduler.

use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

use super::handle::JobResult;
use super::{
    Job, JobError, JobExecutor, JobHandle, JobSpec, JobStatus, QueueConfig, QueueError,
    QueueEvent, QueueListener, QueueStatus,
};
use crate::adapter::ConversionOutcome;
use crate::metrics;
use crate::normalizer::ErrorKind;

/// Admits up to `max_concurrent` jobs at a time; the rest wait in FIFO
/// order.
///
/// All bookkeeping lives behind one mutex whose critical sections never
/// await. Each admitted job runs in its own tokio task, so `submit` must be
/// called from within a runtime.
///
/// Cloning is cheap and yields another handle to the same queue.
pub struct TaskQueue<E: JobExecutor> {
    inner: Arc<Inner<E>>,
}

impl<E: JobExecutor> Clone for TaskQueue<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<E> {
    config: QueueConfig,
    executor: Arc<E>,
    state: Mutex<QueueState>,
    events: broadcast::Sender<QueueEvent>,
    listeners: RwLock<Vec<QueueListener>>,
}

#[derive(Default)]
struct QueueState {
    jobs: HashMap<String, Job>,
    pending: VecDeque<String>,
    waiters: HashMap<String, oneshot::Sender<JobResult>>,
    processing: usize,
    /// Terminal job ids, oldest first, for history eviction.
    finished: VecDeque<String>,
    completed_total: u64,
    failed_total: u64,
    cancelled_total: u64,
}

impl QueueState {
    fn retire(&mut self, id: &str, history_limit: usize) {
        self.finished.push_back(id.to_string());
        while self.finished.len() > history_limit {
            if let Some(old) = self.finished.pop_front() {
                self.jobs.remove(&old);
            }
        }
    }

    /// Removes a pending job and marks it cancelled.
    fn cancel_pending(
        &mut self,
        id: &str,
        history_limit: usize,
    ) -> Option<(Job, Option<oneshot::Sender<JobResult>>)> {
        let position = self.pending.iter().position(|p| p == id)?;
        self.pending.remove(position);

        let job = self.jobs.get_mut(id)?;
        job.cancel(JobError::cancelled());
        let snapshot = job.clone();

        self.cancelled_total += 1;
        let waiter = self.waiters.remove(id);
        self.retire(id, history_limit);
        Some((snapshot, waiter))
    }

    fn record_gauges(&self) {
        metrics::JOBS_PROCESSING.set(self.processing as i64);
        metrics::JOBS_PENDING.set(self.pending.len() as i64);
    }
}

impl<E: JobExecutor> TaskQueue<E> {
    pub fn new(mut config: QueueConfig, executor: Arc<E>) -> Self {
        // A zero limit would never admit anything
        config.max_concurrent = config.max_concurrent.max(1);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                config,
                executor,
                state: Mutex::new(QueueState::default()),
                events,
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Registers a listener, builder style.
    pub fn with_listener(self, listener: QueueListener) -> Self {
        self.add_listener(listener);
        self
    }

    /// Registers a callback invoked for every lifecycle event.
    pub fn add_listener(&self, listener: QueueListener) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Subscribes to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.inner.executor
    }

    /// Queues a job and returns a handle resolving to its result.
    ///
    /// When a slot is free the job is processing by the time this returns.
    pub fn submit(&self, spec: JobSpec) -> Result<JobHandle, QueueError> {
        let job = Job::from_spec(spec);
        let id = job.id.clone();
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.lock();
            if state.jobs.contains_key(&id) {
                return Err(QueueError::DuplicateJob(id));
            }
            state.jobs.insert(id.clone(), job.clone());
            state.pending.push_back(id.clone());
            state.waiters.insert(id.clone(), tx);
            state.record_gauges();
        }

        metrics::JOBS_SUBMITTED
            .with_label_values(&[job.domain.as_str()])
            .inc();
        info!(
            job_id = %id,
            domain = %job.domain,
            target_format = %job.target_format,
            "Job submitted"
        );
        self.inner.emit(QueueEvent::TaskAdded { job });

        self.inner.admit_pending();
        Ok(JobHandle::new(id, rx))
    }

    /// Cancels a job that has not started yet.
    ///
    /// Returns false for processing, finished and unknown jobs.
    pub fn cancel(&self, job_id: &str) -> bool {
        let cancelled = {
            let mut state = self.inner.lock();
            let cancelled = state.cancel_pending(job_id, self.inner.config.history_limit);
            state.record_gauges();
            cancelled
        };

        match cancelled {
            Some((job, waiter)) => {
                self.inner.settle_cancelled(job, waiter);
                true
            }
            None => {
                debug!(job_id = %job_id, "Cancel ignored, job is not pending");
                false
            }
        }
    }

    /// Cancels every pending job. Processing jobs are left to finish.
    pub fn clear(&self) -> Vec<Job> {
        let cancelled: Vec<_> = {
            let mut state = self.inner.lock();
            let ids: Vec<String> = state.pending.iter().cloned().collect();
            let cancelled = ids
                .iter()
                .filter_map(|id| state.cancel_pending(id, self.inner.config.history_limit))
                .collect();
            state.record_gauges();
            cancelled
        };

        let mut jobs = Vec::with_capacity(cancelled.len());
        for (job, waiter) in cancelled {
            jobs.push(job.clone());
            self.inner.settle_cancelled(job, waiter);
        }

        info!(cancelled = jobs.len(), "Queue cleared");
        self.inner.emit(QueueEvent::QueueCleared {
            cancelled: jobs.iter().map(|j| j.id.clone()).collect(),
        });
        jobs
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.inner.lock();
        QueueStatus {
            total: state.pending.len() + state.processing,
            pending: state.pending.len(),
            processing: state.processing,
            max_concurrent: self.inner.config.max_concurrent,
            completed: state.completed_total,
            failed: state.failed_total,
            cancelled: state.cancelled_total,
        }
    }

    /// Snapshot of a job, while it is pending, processing or in history.
    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.inner.lock().jobs.get(job_id).cloned()
    }

    /// Pending jobs in admission order.
    pub fn pending_jobs(&self) -> Vec<Job> {
        let state = self.inner.lock();
        state
            .pending
            .iter()
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect()
    }

    /// Jobs currently processing, oldest start first.
    pub fn processing_jobs(&self) -> Vec<Job> {
        let state = self.inner.lock();
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Processing)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.started_at);
        jobs
    }
}

impl<E: JobExecutor> Inner<E> {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Critical sections never panic mid-update, so a poisoned lock
        // still holds consistent state
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: QueueEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in listeners {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| listener(&event)));
            if result.is_err() {
                warn!(event = event.name(), "Queue listener panicked");
            }
        }
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn settle_cancelled(&self, job: Job, waiter: Option<oneshot::Sender<JobResult>>) {
        metrics::JOBS_CANCELLED
            .with_label_values(&[job.domain.as_str()])
            .inc();
        info!(job_id = %job.id, domain = %job.domain, "Job cancelled");
        self.emit(QueueEvent::TaskCancelled { job });
        if let Some(tx) = waiter {
            let _ = tx.send(Err(JobError::cancelled()));
        }
    }

    /// Starts pending jobs while slots are free.
    fn admit_pending(self: &Arc<Self>) {
        let started = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let mut started = Vec::new();
            while state.processing < self.config.max_concurrent {
                let Some(id) = state.pending.pop_front() else {
                    break;
                };
                if let Some(job) = state.jobs.get_mut(&id) {
                    job.start();
                    state.processing += 1;
                    started.push(job.clone());
                }
            }
            state.record_gauges();
            started
        };

        for job in started {
            debug!(job_id = %job.id, domain = %job.domain, "Job started");
            self.emit(QueueEvent::TaskStarted { job: job.clone() });
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.run_job(job).await;
            });
        }
    }

    async fn run_job(self: Arc<Self>, job: Job) {
        let started = Instant::now();

        let outcome = match AssertUnwindSafe(self.executor.execute(&job))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome.normalized(),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(job_id = %job.id, reason = %reason, "Job executor panicked");
                ConversionOutcome::failed(
                    ErrorKind::conversion_failed(),
                    format!("Conversion crashed: {}", reason),
                )
            }
        };

        self.finish(&job.id, outcome, started);
        self.admit_pending();
    }

    fn finish(&self, id: &str, outcome: ConversionOutcome, started: Instant) {
        let elapsed = started.elapsed();
        let settled = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.processing = state.processing.saturating_sub(1);
            let waiter = state.waiters.remove(id);

            let settled = state.jobs.get_mut(id).map(|job| {
                let reply = if outcome.success {
                    job.complete(outcome.clone());
                    Ok(outcome)
                } else {
                    let err = JobError::from_outcome(&outcome);
                    job.fail(err.clone());
                    Err(err)
                };
                (job.clone(), reply)
            });

            match &settled {
                Some((_, Ok(_))) => state.completed_total += 1,
                Some((_, Err(_))) => state.failed_total += 1,
                None => {}
            }
            if settled.is_some() {
                state.retire(id, self.config.history_limit);
            }
            state.record_gauges();
            settled.map(|(job, reply)| (job, reply, waiter))
        };

        let Some((job, reply, waiter)) = settled else {
            warn!(job_id = %id, "Finished job is no longer tracked");
            return;
        };

        let domain = job.domain.as_str();
        let event = match &reply {
            Ok(_) => {
                metrics::JOBS_COMPLETED.with_label_values(&[domain]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&[domain, "completed"])
                    .observe(elapsed.as_secs_f64());
                info!(
                    job_id = %job.id,
                    domain = %domain,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job completed"
                );
                QueueEvent::TaskCompleted { job }
            }
            Err(err) => {
                metrics::JOBS_FAILED
                    .with_label_values(&[domain, err.kind.code()])
                    .inc();
                metrics::JOB_DURATION
                    .with_label_values(&[domain, "failed"])
                    .observe(elapsed.as_secs_f64());
                warn!(
                    job_id = %job.id,
                    domain = %domain,
                    kind = %err.kind,
                    error = %err,
                    "Job failed"
                );
                QueueEvent::TaskFailed { job }
            }
        };

        self.emit(event);
        if let Some(tx) = waiter {
            let _ = tx.send(reply);
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
