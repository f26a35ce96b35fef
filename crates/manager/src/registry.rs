use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use solverhub_core::{SolverHubError, SolverHubResult, TenantId};

use crate::engine::Engine;
use crate::job::JobHandle;

/// Concurrency-safe store enforcing at most one job per tenant id.
///
/// Sharded: registrations and lookups for different tenants only contend
/// when their keys land in the same shard, and then only briefly.
pub struct JobRegistry<E: Engine> {
    jobs: DashMap<TenantId, Arc<JobHandle<E>>>,
}

impl<E: Engine> JobRegistry<E> {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Insert `job` unless the tenant id is already taken.
    ///
    /// The test and the insert happen under one shard lock, so of two
    /// concurrent registrations for the same id exactly one succeeds.
    pub fn register(&self, job: Arc<JobHandle<E>>) -> SolverHubResult<()> {
        match self.jobs.entry(job.tenant_id().clone()) {
            Entry::Occupied(occupied) => {
                Err(SolverHubError::DuplicateTenant(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(job);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, tenant_id: &TenantId) -> SolverHubResult<Arc<JobHandle<E>>> {
        self.jobs
            .get(tenant_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SolverHubError::NotFound(tenant_id.clone()))
    }

    pub fn contains(&self, tenant_id: &TenantId) -> bool {
        self.jobs.contains_key(tenant_id)
    }

    /// Remove the entry only if it still is this very job.
    ///
    /// Used to roll back a registration whose scheduling failed.
    pub fn unregister_if_same(&self, job: &Arc<JobHandle<E>>) -> bool {
        self.jobs
            .remove_if(job.tenant_id(), |_, current| Arc::ptr_eq(current, job))
            .is_some()
    }

    /// Remove a job that has reached a terminal phase.
    pub fn remove_terminal(&self, tenant_id: &TenantId) -> SolverHubResult<Arc<JobHandle<E>>> {
        if let Some((_, job)) = self.jobs.remove_if(tenant_id, |_, job| job.is_terminal()) {
            return Ok(job);
        }
        if self.jobs.contains_key(tenant_id) {
            Err(SolverHubError::JobStillActive(tenant_id.clone()))
        } else {
            Err(SolverHubError::NotFound(tenant_id.clone()))
        }
    }

    /// Drop terminal jobs that finished at least `retention` before `now`.
    pub fn evict_expired(&self, now: DateTime<Utc>, retention: Duration) -> Vec<TenantId> {
        let expired = |job: &Arc<JobHandle<E>>| {
            job.is_terminal()
                && job
                    .finished_at()
                    .and_then(|at| now.signed_duration_since(at).to_std().ok())
                    .is_some_and(|age| age >= retention)
        };

        // Collect first: removing while iterating would deadlock on the shard.
        let candidates: Vec<TenantId> = self
            .jobs
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter(|tenant| self.jobs.remove_if(tenant, |_, job| expired(job)).is_some())
            .collect()
    }

    /// Snapshot of every registered job.
    pub fn handles(&self) -> Vec<Arc<JobHandle<E>>> {
        self.jobs.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        tenants.sort();
        tenants
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl<E: Engine> Default for JobRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
