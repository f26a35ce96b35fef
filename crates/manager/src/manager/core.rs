use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::PoisonError;

use tokio::sync::broadcast;
use tracing::info;

use solverhub_core::{ManagerConfig, SolverHubResult};

use crate::engine::EngineFactory;
use crate::events::{EventBus, JobEvent};
use crate::metrics::{new_shared_metrics, ManagerMetrics, SharedMetrics};
use crate::pool::WorkerPool;
use crate::registry::JobRegistry;

/// Multi-tenant asynchronous solver job manager.
///
/// Composes a [`JobRegistry`], a [`WorkerPool`] and an [`EngineFactory`]
/// into submit / query operations. All methods take `&self`; share the
/// manager across threads with an `Arc`.
pub struct SolverManager<F: EngineFactory> {
    pub(super) config: ManagerConfig,
    /// Shared, immutable engine settings. One engine is built per job.
    pub(super) factory: F,
    pub(super) registry: JobRegistry<F::Engine>,
    pub(super) pool: WorkerPool,
    pub(super) events: EventBus,
    pub(super) metrics: SharedMetrics,
    /// Counter behind `submit_anonymous` ids.
    pub(super) next_anonymous_id: AtomicU64,
    pub(super) shut_down: AtomicBool,
}

impl<F: EngineFactory> SolverManager<F> {
    /// Create a manager and start its worker pool.
    pub fn new(config: ManagerConfig, factory: F) -> SolverHubResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(&config.pool)?;
        info!(
            "Solver manager ready: {} workers available on {} cores",
            pool.capacity(),
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0)
        );

        Ok(Self {
            events: EventBus::new(config.event_capacity),
            config,
            factory,
            registry: JobRegistry::new(),
            pool,
            metrics: new_shared_metrics(),
            next_anonymous_id: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Number of worker threads, i.e. how many jobs solve at once.
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Receive a [`JobEvent`] for every lifecycle transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Get a snapshot of the current manager metrics.
    pub fn metrics(&self) -> ManagerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .with_gauges(
                self.registry.len(),
                self.pool.queued(),
                self.pool.active(),
                self.pool.capacity(),
            )
    }
}
