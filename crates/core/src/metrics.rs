//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Task queue (submissions, outcomes, durations, occupancy)
//! - External tools (invocations, timeouts)
//! - Routing and janitor sweeps

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Task Queue
// =============================================================================

/// Jobs submitted by domain.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_jobs_submitted_total", "Total jobs submitted"),
        &["domain"],
    )
    .unwrap()
});

/// Jobs completed successfully by domain.
pub static JOBS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_jobs_completed_total", "Total jobs completed"),
        &["domain"],
    )
    .unwrap()
});

/// Jobs failed by domain and error kind.
pub static JOBS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_jobs_failed_total", "Total jobs failed"),
        &["domain", "kind"], // "tool_timeout", "tool_execution_failed", ...
    )
    .unwrap()
});

/// Pending jobs cancelled by domain.
pub static JOBS_CANCELLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_jobs_cancelled_total", "Total jobs cancelled"),
        &["domain"],
    )
    .unwrap()
});

/// Time from admission to settlement in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("fileforge_job_duration_seconds", "Duration of job processing")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0]),
        &["domain", "result"], // "completed", "failed"
    )
    .unwrap()
});

/// Jobs currently processing.
pub static JOBS_PROCESSING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("fileforge_jobs_processing", "Jobs currently processing").unwrap()
});

/// Jobs waiting for a slot.
pub static JOBS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("fileforge_jobs_pending", "Jobs waiting for admission").unwrap()
});

// =============================================================================
// External Tools
// =============================================================================

/// Tool invocations by program and result.
pub static TOOL_INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileforge_tool_invocations_total",
            "Total external tool invocations",
        ),
        &["program", "result"], // "ok", "failed", "timeout", "spawn_error"
    )
    .unwrap()
});

/// Tool runs killed for exceeding their time limit.
pub static TOOL_TIMEOUTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_tool_timeouts_total", "Total tool timeouts"),
        &["domain"],
    )
    .unwrap()
});

// =============================================================================
// Routing & Janitor
// =============================================================================

/// Requests rejected as unsupported conversions.
pub static ROUTING_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileforge_routing_rejections_total",
            "Total unsupported conversion requests",
        ),
        &["domain"],
    )
    .unwrap()
});

/// Expired files and directories removed.
pub static JANITOR_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fileforge_janitor_removed_total",
        "Total expired entries removed by the janitor",
    )
    .unwrap()
});

// =============================================================================
// Registration Helper
// =============================================================================

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOBS_CANCELLED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(JOBS_PROCESSING.clone()),
        Box::new(JOBS_PENDING.clone()),
        // Tools
        Box::new(TOOL_INVOCATIONS.clone()),
        Box::new(TOOL_TIMEOUTS.clone()),
        // Routing & janitor
        Box::new(ROUTING_REJECTIONS.clone()),
        Box::new(JANITOR_REMOVED.clone()),
    ]
}
