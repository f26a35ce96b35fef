use std::sync::Arc;

use tracing::debug;

use solverhub_core::{SolverHubResult, TenantId};

use crate::engine::{Engine, EngineFactory};
use crate::job::{JobFailure, JobHandle, JobInfo};
use crate::status::JobStatus;

use super::SolverManager;

type EngineOf<F> = <F as EngineFactory>::Engine;

impl<F: EngineFactory> SolverManager<F> {
    /// The job registered for `tenant_id`.
    pub fn job(&self, tenant_id: &TenantId) -> SolverHubResult<Arc<JobHandle<EngineOf<F>>>> {
        self.registry.lookup(tenant_id)
    }

    /// Best solution so far (the submitted problem until the engine has one).
    pub fn best_solution(
        &self,
        tenant_id: &TenantId,
    ) -> SolverHubResult<<EngineOf<F> as Engine>::Solution> {
        debug!(tenant = %tenant_id, "Getting best solution");
        Ok(self.registry.lookup(tenant_id)?.best_solution())
    }

    /// Score of the best solution so far; `None` until the engine scored one.
    pub fn best_score(
        &self,
        tenant_id: &TenantId,
    ) -> SolverHubResult<Option<<EngineOf<F> as Engine>::Score>> {
        debug!(tenant = %tenant_id, "Getting best score");
        Ok(self.registry.lookup(tenant_id)?.best_score())
    }

    pub fn status(&self, tenant_id: &TenantId) -> SolverHubResult<JobStatus> {
        debug!(tenant = %tenant_id, "Getting solver status");
        Ok(self.registry.lookup(tenant_id)?.status())
    }

    /// Why the job failed, if it did.
    pub fn failure(&self, tenant_id: &TenantId) -> SolverHubResult<Option<JobFailure>> {
        Ok(self.registry.lookup(tenant_id)?.failure())
    }

    pub fn job_info(&self, tenant_id: &TenantId) -> SolverHubResult<JobInfo> {
        Ok(self.registry.lookup(tenant_id)?.info())
    }

    /// Info for every registered job, ordered by tenant id.
    pub fn list_jobs(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self.registry.handles().iter().map(|h| h.info()).collect();
        infos.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id));
        infos
    }

    pub fn tenants(&self) -> Vec<TenantId> {
        self.registry.tenants()
    }
}
