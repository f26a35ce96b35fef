//! Multi-tenant asynchronous job manager for long-running solver searches.
//!
//! A [`SolverManager`] accepts one problem per tenant id, runs each search
//! on a bounded [`WorkerPool`], and answers status / best-score /
//! best-solution queries while the search is still improving its result.
//!
//! The search itself is supplied through the [`Engine`] trait.

pub mod engine;
pub mod events;
pub mod job;
pub mod manager;
pub mod metrics;
pub mod pool;
pub mod registry;
pub mod status;

pub use engine::{Engine, EngineError, EngineFactory};
pub use events::{EventBus, JobEvent, JobEventKind};
pub use job::{FailureKind, JobFailure, JobHandle, JobInfo, JobRun};
pub use manager::SolverManager;
pub use metrics::ManagerMetrics;
pub use pool::{PoolTask, QueueSlot, WorkerPool};
pub use registry::JobRegistry;
pub use status::{JobPhase, JobStatus};

pub use solverhub_core::{
    ManagerConfig, PoolConfig, PoolSizing, QueuePolicy, RetentionPolicy, SolverHubError,
    SolverHubResult, TenantId,
};
