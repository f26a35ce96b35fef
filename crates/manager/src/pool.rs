use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use solverhub_core::{PoolConfig, QueuePolicy, SolverHubError, SolverHubResult};

/// A unit of work the pool either runs or, after shutdown, cancels.
pub trait PoolTask: Send + 'static {
    fn run(self: Box<Self>);

    /// Called instead of `run` when the task is dequeued after shutdown.
    fn cancel(self: Box<Self>);
}

/// Bounded set of worker threads, one task per thread at a time.
///
/// Backed by a `rayon` thread pool. Capacity comes from
/// [`PoolConfig::sizing`]; tasks beyond capacity wait in the pool's queue,
/// which is unbounded or bounded according to [`PoolConfig::queue`].
pub struct WorkerPool {
    capacity: usize,
    queue: QueuePolicy,
    pool: RwLock<Option<rayon::ThreadPool>>,
    shutdown: Arc<AtomicBool>,
    /// Reserved slots not yet released: tasks waiting for a worker.
    queued: Arc<AtomicUsize>,
    /// Tasks currently running.
    active: Arc<AtomicUsize>,
}

/// One reserved place in the pool's queue.
///
/// Clones share the reservation; the first [`QueueSlot::release`] frees it
/// and later calls are no-ops.
#[derive(Debug, Clone)]
pub struct QueueSlot {
    released: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
}

impl QueueSlot {
    /// Returns `true` if this call freed the slot.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.queued.fetch_sub(1, Ordering::SeqCst);
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Decrements the active counter even if the task unwinds.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> SolverHubResult<Self> {
        let capacity = config.resolved_worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(capacity)
            .thread_name(|i| format!("solver-worker-{}", i))
            .build()
            .map_err(|e| SolverHubError::Pool(format!("failed to build worker pool: {}", e)))?;

        info!(
            "Worker pool started with {} workers (sizing {}, queue {:?})",
            capacity, config.sizing, config.queue
        );

        Ok(Self {
            capacity,
            queue: config.queue,
            pool: RwLock::new(Some(pool)),
            shutdown: Arc::new(AtomicBool::new(false)),
            queued: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Enqueue a task. It runs on a worker as soon as one is free.
    ///
    /// Fails with `PoolSaturated` when a bounded queue is full and with
    /// `ShutDown` after [`WorkerPool::shutdown`]; the task is dropped
    /// unexecuted in both cases.
    pub fn schedule(&self, task: Box<dyn PoolTask>) -> SolverHubResult<()> {
        let slot = self.reserve()?;
        self.schedule_reserved(slot, task)
    }

    /// Claim a place in the queue ahead of [`WorkerPool::schedule_reserved`].
    ///
    /// The returned slot is freed exactly once: when a worker dequeues the
    /// task, or earlier through [`QueueSlot::release`] if the task is
    /// cancelled while it waits.
    pub fn reserve(&self) -> SolverHubResult<QueueSlot> {
        if self.is_shut_down() {
            return Err(SolverHubError::ShutDown);
        }
        self.reserve_queue_slot()?;
        Ok(QueueSlot {
            released: Arc::new(AtomicBool::new(false)),
            queued: Arc::clone(&self.queued),
        })
    }

    /// Hand a task to the workers under a slot from [`WorkerPool::reserve`].
    ///
    /// On `ShutDown` the slot is released and the task dropped.
    pub fn schedule_reserved(&self, slot: QueueSlot, task: Box<dyn PoolTask>) -> SolverHubResult<()> {
        let guard = self.pool.read().unwrap_or_else(PoisonError::into_inner);
        let pool = match guard.as_ref() {
            Some(pool) if !self.shutdown.load(Ordering::SeqCst) => pool,
            _ => {
                slot.release();
                return Err(SolverHubError::ShutDown);
            }
        };

        let shutdown = Arc::clone(&self.shutdown);
        let active = Arc::clone(&self.active);
        pool.spawn(move || {
            slot.release();
            if shutdown.load(Ordering::SeqCst) {
                task.cancel();
                return;
            }
            let _active = ActiveGuard::enter(&active);
            task.run();
        });
        Ok(())
    }

    fn reserve_queue_slot(&self) -> SolverHubResult<()> {
        match self.queue {
            QueuePolicy::Unbounded => {
                self.queued.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            QueuePolicy::Bounded { capacity } => self
                .queued
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |q| {
                    (q < capacity).then_some(q + 1)
                })
                .map(|_| ())
                .map_err(|_| {
                    debug!(capacity, "worker pool queue full, rejecting task");
                    SolverHubError::PoolSaturated { capacity }
                }),
        }
    }

    /// Best-effort, non-blocking shutdown.
    ///
    /// Tasks still queued are cancelled when a worker dequeues them; running
    /// tasks are not interrupted here and finish on their own schedule. The
    /// worker threads exit once idle. Never waits for either.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let active = self.active();
        if active > 0 {
            warn!(active, queued = self.queued(), "Worker pool shutting down with jobs in flight");
        } else {
            info!("Worker pool shutting down");
        }
        drop(pool);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        self.queue
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
