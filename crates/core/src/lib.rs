pub mod config;
pub mod error;
pub mod tenant;

pub use config::{ManagerConfig, PoolConfig, PoolSizing, QueuePolicy, RetentionPolicy};
pub use error::*;
pub use tenant::TenantId;
