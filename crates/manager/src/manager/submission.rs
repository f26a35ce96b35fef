use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use solverhub_core::{SolverHubError, SolverHubResult, TenantId};

use crate::engine::{Engine, EngineFactory};
use crate::events::JobEventKind;
use crate::job::{JobHandle, JobRun};
use crate::metrics;

use super::SolverManager;

type Solution<F> = <<F as EngineFactory>::Engine as Engine>::Solution;

impl<F: EngineFactory> SolverManager<F> {
    /// Start solving `problem` for `tenant_id`.
    ///
    /// Registration happens before scheduling. If the tenant id is taken the
    /// call fails with `DuplicateTenant` and nothing is scheduled; the live
    /// job is left untouched. If the pool refuses the job the registration
    /// is rolled back, so a failed submission leaves no state behind.
    pub fn submit(&self, tenant_id: impl Into<TenantId>, problem: Solution<F>) -> SolverHubResult<()> {
        let tenant_id = tenant_id.into();
        if self.is_shut_down() {
            return Err(SolverHubError::ShutDown);
        }
        self.evict_expired();

        let engine = self.factory.build();
        let handle = Arc::new(JobHandle::new(tenant_id.clone(), engine, problem));

        if let Err(e) = self.registry.register(Arc::clone(&handle)) {
            metrics::update(&self.metrics, |m| m.rejected_duplicate += 1);
            debug!(tenant = %tenant_id, "Rejected submission for existing tenant");
            return Err(e);
        }

        // Published before scheduling so subscribers always see it before `Started`.
        self.events.publish(&tenant_id, JobEventKind::Submitted);

        let run = JobRun::new(Arc::clone(&handle), self.events.clone(), Arc::clone(&self.metrics));
        let scheduled = self.pool.reserve().and_then(|slot| {
            handle.attach_queue_slot(slot.clone());
            self.pool.schedule_reserved(slot, Box::new(run))
        });
        if let Err(e) = scheduled {
            self.registry.unregister_if_same(&handle);
            if matches!(e, SolverHubError::PoolSaturated { .. }) {
                metrics::update(&self.metrics, |m| m.rejected_saturated += 1);
            }
            self.events.publish(
                &tenant_id,
                JobEventKind::Rejected {
                    reason: e.to_string(),
                },
            );
            warn!(tenant = %tenant_id, error = %e, "Could not schedule solver job");
            return Err(e);
        }

        metrics::update(&self.metrics, |m| m.submitted += 1);
        info!(tenant = %tenant_id, "A new solver job was created");
        Ok(())
    }

    /// Submit under a generated tenant id (`job-0`, `job-1`, ...) and return it.
    ///
    /// Ids already taken by explicit submissions are skipped.
    pub fn submit_anonymous(&self, problem: Solution<F>) -> SolverHubResult<TenantId> {
        loop {
            let n = self.next_anonymous_id.fetch_add(1, Ordering::SeqCst);
            let tenant_id = TenantId::new(format!("job-{}", n));
            if self.registry.contains(&tenant_id) {
                continue;
            }
            match self.submit(tenant_id.clone(), problem.clone()) {
                Ok(()) => return Ok(tenant_id),
                // Lost a race with an explicit submission of the same id.
                Err(SolverHubError::DuplicateTenant(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
