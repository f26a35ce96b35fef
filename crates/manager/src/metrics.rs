use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Operational counters for a `SolverManager`.
///
/// Counters are cumulative since construction; the gauges at the bottom are
/// filled in when a snapshot is taken.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManagerMetrics {
    /// Submissions accepted and scheduled.
    pub submitted: u64,
    /// Submissions rejected because the tenant id was taken.
    pub rejected_duplicate: u64,
    /// Submissions rejected by a full bounded queue.
    pub rejected_saturated: u64,
    /// Jobs a worker started solving.
    pub started: u64,
    /// Jobs whose search returned normally.
    pub finished: u64,
    /// Jobs whose search errored or panicked.
    pub failed: u64,
    /// Jobs stopped before they ran.
    pub cancelled: u64,
    /// Terminal jobs removed by release or retention.
    pub evicted: u64,
    /// Average wall time of a search that ran to completion.
    pub avg_solve_duration: Duration,
    /// When the last search finished or failed.
    pub last_completed_at: Option<DateTime<Utc>>,

    /// Jobs currently in the registry.
    pub registered_jobs: usize,
    /// Jobs waiting for a worker.
    pub queued: usize,
    /// Workers currently running a job.
    pub active_workers: usize,
    pub pool_capacity: usize,
    /// active_workers / pool_capacity (0.0 - 1.0).
    pub worker_utilization: f64,
}

/// Thread-safe handle to the manager's metrics.
pub type SharedMetrics = Arc<RwLock<ManagerMetrics>>;

pub fn new_shared_metrics() -> SharedMetrics {
    Arc::new(RwLock::new(ManagerMetrics::default()))
}

/// Apply `f` to the shared metrics, recovering from a poisoned lock.
pub fn update(metrics: &SharedMetrics, f: impl FnOnce(&mut ManagerMetrics)) {
    let mut guard = metrics.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

impl ManagerMetrics {
    /// Record a completed search (normal or failed) and its duration.
    pub fn record_completion(&mut self, duration: Duration, failed: bool) {
        if failed {
            self.failed += 1;
        } else {
            self.finished += 1;
        }
        self.last_completed_at = Some(Utc::now());

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.finished + self.failed;
        self.avg_solve_duration = if count == 1 {
            duration
        } else {
            let prev_nanos = self.avg_solve_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    /// Fill in the point-in-time gauges.
    pub fn with_gauges(
        mut self,
        registered_jobs: usize,
        queued: usize,
        active_workers: usize,
        pool_capacity: usize,
    ) -> Self {
        self.registered_jobs = registered_jobs;
        self.queued = queued;
        self.active_workers = active_workers;
        self.pool_capacity = pool_capacity;
        self.worker_utilization = if pool_capacity == 0 {
            0.0
        } else {
            active_workers as f64 / pool_capacity as f64
        };
        self
    }
}
