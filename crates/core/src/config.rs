//! Solver manager configuration.
//!
//! Split into focused submodules:
//! - `types`: config structs, pool sizing formulas, queue and retention policies
//! - `loading`: TOML parsing, file loading, and `SOLVERHUB_*` env overrides
//! - `validation`: sanity checks applied after every load

mod loading;
mod types;
mod validation;
#[cfg(test)]
mod tests;

pub use loading::load_dotenv;
pub use types::{ManagerConfig, PoolConfig, PoolSizing, QueuePolicy, RetentionPolicy};
