//! The `SolverManager` facade: the only component callers talk to.
//!
//! Split into focused submodules:
//! - `core`: struct, constructor, metrics and event accessors
//! - `submission`: `submit` / `submit_anonymous` (register-before-schedule)
//! - `queries`: per-tenant status, score, solution, and info lookups
//! - `lifecycle`: cooperative stop, release, eviction, and shutdown

mod core;
mod lifecycle;
mod queries;
mod submission;
#[cfg(test)]
mod tests;

pub use self::core::SolverManager;
