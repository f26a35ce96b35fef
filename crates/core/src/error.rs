use thiserror::Error;

use crate::tenant::TenantId;

#[derive(Error, Debug)]
pub enum SolverHubError {
    #[error("Tenant id ({0}) already exists")]
    DuplicateTenant(TenantId),

    #[error("No job registered for tenant id ({0})")]
    NotFound(TenantId),

    #[error("Job for tenant id ({0}) has not reached a terminal state")]
    JobStillActive(TenantId),

    #[error("Worker pool queue is full (capacity {capacity})")]
    PoolSaturated { capacity: usize },

    #[error("Solver manager is shut down")]
    ShutDown,

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}

impl SolverHubError {
    /// Whether the failed call may succeed if repeated unchanged later.
    ///
    /// Only pool saturation is transient; everything else is a terminal
    /// outcome for the call that produced it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SolverHubError::PoolSaturated { .. })
    }
}

pub type SolverHubResult<T> = std::result::Result<T, SolverHubError>;
