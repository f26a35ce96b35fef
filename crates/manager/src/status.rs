use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Externally visible status of a job, derived on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Registered and waiting for a free worker.
    Queued,
    Solving,
    /// An early stop was requested and the search is unwinding.
    TerminatingEarly,
    /// The search returned (or never ran because it was cancelled).
    Stopped,
    /// The search ended abnormally; the cause is kept on the job.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Stopped | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Solving => "SOLVING",
            JobStatus::TerminatingEarly => "TERMINATING_EARLY",
            JobStatus::Stopped => "STOPPED",
            JobStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Lifecycle phase owned by the job itself. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JobPhase {
    Queued = 0,
    Running = 1,
    Finished = 2,
    Failed = 3,
    Cancelled = 4,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Finished | JobPhase::Failed | JobPhase::Cancelled)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => JobPhase::Queued,
            1 => JobPhase::Running,
            2 => JobPhase::Finished,
            3 => JobPhase::Failed,
            _ => JobPhase::Cancelled,
        }
    }
}

/// Atomic cell holding a [`JobPhase`]; transitions are compare-and-swap.
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(JobPhase::Queued as u8))
    }

    pub fn get(&self) -> JobPhase {
        JobPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`. Fails if the phase is no longer `from`.
    pub fn advance(&self, from: JobPhase, to: JobPhase) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the reported status from the job's phase and the engine's
/// early-stop flag.
///
/// The engine's own solving flag is not consulted: while the worker is
/// inside `solve` the job counts as solving even if the engine has not
/// raised (or has already lowered) that flag, so a reader can never see
/// STOPPED followed by SOLVING. Only the terminal phase yields STOPPED.
pub fn derive_status(phase: JobPhase, terminating_early: bool) -> JobStatus {
    match phase {
        JobPhase::Failed => JobStatus::Failed,
        JobPhase::Finished | JobPhase::Cancelled => JobStatus::Stopped,
        _ if terminating_early => JobStatus::TerminatingEarly,
        JobPhase::Queued => JobStatus::Queued,
        JobPhase::Running => JobStatus::Solving,
    }
}
