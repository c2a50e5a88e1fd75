//! Expiry of transient files.
//!
//! Uploads and conversion outputs only live long enough to be downloaded.
//! The janitor periodically removes anything in the watched directories
//! whose modification time is older than `max_age_secs`. Extracted archives
//! are directories and are removed whole.

mod config;

pub use config::JanitorConfig;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::metrics;

/// What one sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    /// Entries that could not be inspected or removed.
    pub errors: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.files_removed + self.dirs_removed
    }
}

/// Periodically sweeps a set of directories.
pub struct Janitor {
    config: JanitorConfig,
    dirs: Vec<PathBuf>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Janitor {
    pub fn new(config: JanitorConfig, dirs: Vec<PathBuf>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            dirs,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Removes every expired entry directly under the watched directories.
    ///
    /// A missing directory is skipped. Errors are counted and logged, never
    /// returned.
    pub async fn sweep(&self) -> SweepReport {
        sweep_dirs(&self.dirs, self.config.max_age(), SystemTime::now()).await
    }

    /// Spawns the sweep loop. Does nothing when disabled or already running.
    pub fn start(&self) {
        if !self.config.enabled {
            info!("Janitor disabled");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Janitor already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let dirs = self.dirs.clone();
        let max_age = self.config.max_age();
        let interval = self.config.interval();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(
                max_age_secs = max_age.as_secs(),
                interval_secs = interval.as_secs(),
                "Janitor started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let report = sweep_dirs(&dirs, max_age, SystemTime::now()).await;
                        if report.removed() > 0 || report.errors > 0 {
                            info!(
                                files = report.files_removed,
                                dirs = report.dirs_removed,
                                errors = report.errors,
                                "Janitor sweep"
                            );
                        }
                    }
                }
            }
            info!("Janitor stopped");
        });
    }

    /// Stops the sweep loop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}

async fn sweep_dirs(dirs: &[PathBuf], max_age: Duration, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();
    for dir in dirs {
        sweep_dir(dir, max_age, now, &mut report).await;
    }
    if report.removed() > 0 {
        metrics::JANITOR_REMOVED.inc_by(report.removed() as u64);
    }
    report
}

async fn sweep_dir(dir: &Path, max_age: Duration, now: SystemTime, report: &mut SweepReport) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Janitor cannot read directory");
            report.errors += 1;
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Janitor failed to list directory");
                report.errors += 1;
                break;
            }
        };
        let path = entry.path();

        let meta = match entry.metadata().await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping entry");
                report.errors += 1;
                continue;
            }
        };
        // Clock skew can put mtime in the future; such entries are fresh
        let expired = meta
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .is_some_and(|age| age > max_age);
        if !expired {
            continue;
        }

        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match removed {
            Ok(()) => {
                debug!(path = %path.display(), "Removed expired entry");
                if meta.is_dir() {
                    report.dirs_removed += 1;
                } else {
                    report.files_removed += 1;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove expired entry");
                report.errors += 1;
            }
        }
    }
}
