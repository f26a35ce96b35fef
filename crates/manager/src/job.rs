use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use solverhub_core::TenantId;

use crate::engine::Engine;
use crate::events::{EventBus, JobEventKind};
use crate::metrics::{self, SharedMetrics};
use crate::pool::{PoolTask, QueueSlot};
use crate::status::{derive_status, JobPhase, JobStatus, PhaseCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// `Engine::solve` returned an error.
    Error,
    /// `Engine::solve` panicked.
    Panic,
}

/// Why a job ended in [`JobStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Serializable point-in-time view of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub tenant_id: TenantId,
    pub status: JobStatus,
    pub phase: JobPhase,
    /// Best score in the engine's own display format.
    pub best_score: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failure: Option<JobFailure>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Timeline {
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

/// The queryable side of a job, shared between the registry and its run.
///
/// Owns the job's engine and the submitted problem. Every accessor is safe
/// to call from any thread while the worker is solving.
pub struct JobHandle<E: Engine> {
    tenant_id: TenantId,
    engine: E,
    problem: E::Solution,
    phase: PhaseCell,
    submitted_at: DateTime<Utc>,
    timeline: RwLock<Timeline>,
    failure: RwLock<Option<JobFailure>>,
    /// Queue reservation held while the job waits for a worker.
    queue_slot: OnceLock<QueueSlot>,
}

impl<E: Engine> JobHandle<E> {
    pub fn new(tenant_id: TenantId, engine: E, problem: E::Solution) -> Self {
        Self {
            tenant_id,
            engine,
            problem,
            phase: PhaseCell::new(),
            submitted_at: Utc::now(),
            timeline: RwLock::new(Timeline::default()),
            failure: RwLock::new(None),
            queue_slot: OnceLock::new(),
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The problem as it was submitted.
    pub fn problem(&self) -> &E::Solution {
        &self.problem
    }

    pub fn phase(&self) -> JobPhase {
        self.phase.get()
    }

    pub fn status(&self) -> JobStatus {
        // Read the phase first: if it is already terminal the flags are ignored.
        let phase = self.phase.get();
        derive_status(phase, self.engine.is_terminating_early())
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.get().is_terminal()
    }

    /// Best solution so far, or the submitted problem if the engine has none yet.
    pub fn best_solution(&self) -> E::Solution {
        self.engine
            .best_solution()
            .unwrap_or_else(|| self.problem.clone())
    }

    pub fn best_score(&self) -> Option<E::Score> {
        self.engine.best_score()
    }

    pub fn failure(&self) -> Option<JobFailure> {
        self.failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timeline().started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.timeline().finished_at
    }

    pub fn info(&self) -> JobInfo {
        let timeline = self.timeline();
        JobInfo {
            tenant_id: self.tenant_id.clone(),
            status: self.status(),
            phase: self.phase(),
            best_score: self.best_score().map(|s| s.to_string()),
            submitted_at: self.submitted_at,
            started_at: timeline.started_at,
            finished_at: timeline.finished_at,
            failure: self.failure(),
        }
    }

    /// Cancel the job if no worker has picked it up yet.
    ///
    /// Returns `true` if this call moved the job from queued to cancelled.
    pub fn cancel_if_queued(&self) -> bool {
        if self.phase.advance(JobPhase::Queued, JobPhase::Cancelled) {
            self.mark_finished();
            self.release_queue_slot();
            true
        } else {
            false
        }
    }

    /// Tie the job to its queue reservation, so cancelling the job frees
    /// the place in the queue without waiting for a worker to dequeue it.
    pub fn attach_queue_slot(&self, slot: QueueSlot) {
        let _ = self.queue_slot.set(slot);
        // Cancelled between registration and reservation.
        if self.phase.get() == JobPhase::Cancelled {
            self.release_queue_slot();
        }
    }

    fn release_queue_slot(&self) {
        if let Some(slot) = self.queue_slot.get() {
            slot.release();
        }
    }

    /// Cooperative stop: cancels a queued job, or asks a running engine to stop.
    ///
    /// Returns `false` if the job was already terminal or a stop was already
    /// pending.
    pub fn request_early_stop(&self) -> bool {
        if self.cancel_if_queued() {
            return true;
        }
        match self.phase.get() {
            JobPhase::Running => self.engine.request_early_stop(),
            _ => false,
        }
    }

    fn timeline(&self) -> Timeline {
        *self.timeline.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_started(&self) {
        let mut timeline = self.timeline.write().unwrap_or_else(PoisonError::into_inner);
        timeline.started_at = Some(Utc::now());
    }

    fn mark_finished(&self) {
        let mut timeline = self.timeline.write().unwrap_or_else(PoisonError::into_inner);
        timeline.finished_at = Some(Utc::now());
    }

    fn record_failure(&self, kind: FailureKind, message: String) {
        let mut failure = self.failure.write().unwrap_or_else(PoisonError::into_inner);
        *failure = Some(JobFailure {
            kind,
            message,
            at: Utc::now(),
        });
    }
}

impl<E: Engine> std::fmt::Debug for JobHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("tenant_id", &self.tenant_id)
            .field("phase", &self.phase.get())
            .finish_non_exhaustive()
    }
}

/// The unit of work handed to the pool. Runs its job's engine exactly once.
pub struct JobRun<E: Engine> {
    handle: Arc<JobHandle<E>>,
    events: EventBus,
    metrics: SharedMetrics,
}

impl<E: Engine> JobRun<E> {
    pub fn new(handle: Arc<JobHandle<E>>, events: EventBus, metrics: SharedMetrics) -> Self {
        Self {
            handle,
            events,
            metrics,
        }
    }

    pub fn handle(&self) -> &Arc<JobHandle<E>> {
        &self.handle
    }

    /// Solve on the current thread, capturing errors and panics as failures.
    pub fn execute(self) {
        let handle = &self.handle;
        let tenant = handle.tenant_id();

        if !handle.phase.advance(JobPhase::Queued, JobPhase::Running) {
            debug!(tenant = %tenant, phase = ?handle.phase(), "job no longer queued, skipping");
            return;
        }
        handle.mark_started();
        metrics::update(&self.metrics, |m| m.started += 1);
        self.events.publish(tenant, JobEventKind::Started);
        info!(tenant = %tenant, "Running solver job");

        let start = Instant::now();
        let problem = handle.problem.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.engine.solve(problem)));
        let elapsed = start.elapsed();

        // Side effects land before the terminal phase so anyone who observes
        // STOPPED or FAILED also sees the failure cause, metrics and event.
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some((FailureKind::Error, e.to_string())),
            Err(payload) => Some((FailureKind::Panic, panic_message(payload.as_ref()))),
        };

        match failure {
            None => {
                handle.mark_finished();
                metrics::update(&self.metrics, |m| m.record_completion(elapsed, false));
                info!(tenant = %tenant, elapsed_ms = elapsed.as_millis() as u64, "Solver job finished");
                self.events.publish(
                    tenant,
                    JobEventKind::Finished {
                        duration_ms: elapsed.as_millis() as u64,
                    },
                );
                handle.phase.advance(JobPhase::Running, JobPhase::Finished);
            }
            Some((kind, message)) => {
                handle.record_failure(kind, message.clone());
                handle.mark_finished();
                metrics::update(&self.metrics, |m| m.record_completion(elapsed, true));
                error!(tenant = %tenant, ?kind, error = %message, "Solver job failed");
                self.events.publish(tenant, JobEventKind::Failed { message });
                handle.phase.advance(JobPhase::Running, JobPhase::Failed);
            }
        }
    }

    /// Mark the job stopped without running it.
    pub fn abandon(self) {
        if self.handle.cancel_if_queued() {
            metrics::update(&self.metrics, |m| m.cancelled += 1);
            self.events.publish(self.handle.tenant_id(), JobEventKind::Cancelled);
            debug!(tenant = %self.handle.tenant_id(), "Solver job cancelled before it ran");
        }
    }
}

impl<E: Engine> PoolTask for JobRun<E> {
    fn run(self: Box<Self>) {
        self.execute();
    }

    fn cancel(self: Box<Self>) {
        self.abandon();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "engine panicked with a non-string payload".to_string()
    }
}
