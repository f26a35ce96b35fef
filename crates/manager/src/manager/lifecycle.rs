use std::sync::atomic::Ordering;

use chrono::Utc;
use tracing::{debug, info};

use solverhub_core::{SolverHubResult, TenantId};

use crate::engine::EngineFactory;
use crate::events::JobEventKind;
use crate::metrics;

use super::SolverManager;

impl<F: EngineFactory> SolverManager<F> {
    /// Ask the tenant's search to stop early.
    ///
    /// Cooperative: a queued job is cancelled before it runs; a running
    /// engine is signalled and stops at its own discretion. Returns `false`
    /// if the job was already terminal or a stop was already pending.
    pub fn terminate_early(&self, tenant_id: &TenantId) -> SolverHubResult<bool> {
        let job = self.registry.lookup(tenant_id)?;
        let was_queued = job.cancel_if_queued();
        if was_queued {
            metrics::update(&self.metrics, |m| m.cancelled += 1);
            self.events.publish(tenant_id, JobEventKind::Cancelled);
            info!(tenant = %tenant_id, "Cancelled queued solver job");
            return Ok(true);
        }
        let requested = job.request_early_stop();
        if requested {
            info!(tenant = %tenant_id, "Requested early termination");
        }
        Ok(requested)
    }

    /// Remove a terminal job, freeing its tenant id for a new submission.
    pub fn release(&self, tenant_id: &TenantId) -> SolverHubResult<()> {
        self.registry.remove_terminal(tenant_id)?;
        metrics::update(&self.metrics, |m| m.evicted += 1);
        self.events.publish(tenant_id, JobEventKind::Evicted);
        info!(tenant = %tenant_id, "Released solver job");
        Ok(())
    }

    /// Apply the retention policy now. Returns the evicted tenant ids.
    pub fn evict_expired(&self) -> Vec<TenantId> {
        let Some(retention) = self.config.retention.retention() else {
            return Vec::new();
        };
        let evicted = self.registry.evict_expired(Utc::now(), retention);
        if !evicted.is_empty() {
            metrics::update(&self.metrics, |m| m.evicted += evicted.len() as u64);
            for tenant_id in &evicted {
                self.events.publish(tenant_id, JobEventKind::Evicted);
            }
            debug!(count = evicted.len(), "Evicted expired solver jobs");
        }
        evicted
    }

    /// Best-effort, non-blocking shutdown.
    ///
    /// Queued jobs are cancelled, running engines are asked to stop early,
    /// and the pool stops accepting work. Does not wait for running searches
    /// to unwind. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down solver manager");

        let mut cancelled = 0u64;
        for job in self.registry.handles() {
            if job.cancel_if_queued() {
                cancelled += 1;
                self.events.publish(job.tenant_id(), JobEventKind::Cancelled);
            } else if !job.is_terminal() {
                job.request_early_stop();
            }
        }
        if cancelled > 0 {
            metrics::update(&self.metrics, |m| m.cancelled += cancelled);
        }
        self.pool.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl<F: EngineFactory> Drop for SolverManager<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
