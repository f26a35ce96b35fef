use crate::error::SolverHubError;

use super::types::{ManagerConfig, PoolSizing, QueuePolicy};

impl ManagerConfig {
    /// Validate the config: reject sizes that would leave the manager unusable.
    pub fn validate(&self) -> Result<(), SolverHubError> {
        self.validate_sizing()?;
        self.validate_queue()?;
        if self.event_capacity == 0 {
            return Err(SolverHubError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_sizing(&self) -> Result<(), SolverHubError> {
        match self.pool.sizing {
            PoolSizing::Fixed(0) => Err(SolverHubError::Config(
                "pool sizing must name at least one worker".to_string(),
            )),
            PoolSizing::PerCore(0) => Err(SolverHubError::Config(
                "per-core pool multiplier must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_queue(&self) -> Result<(), SolverHubError> {
        if let QueuePolicy::Bounded { capacity: 0 } = self.pool.queue {
            return Err(SolverHubError::Config(
                "bounded queue capacity must be at least 1 (use unbounded instead)".to_string(),
            ));
        }
        Ok(())
    }
}
