//! Cloud balancing: assign processes to computers without exceeding
//! capacity, at the lowest total cost.
//!
//! Provides the domain model, a hard/soft score, a seeded local search
//! [`LocalSearchEngine`] that plugs into `solverhub-manager`, and a random
//! problem generator.

pub mod calculator;
pub mod domain;
pub mod engine;
pub mod generator;
pub mod score;

pub use calculator::ScoreCalculator;
pub use domain::{CloudBalance, CloudComputer, CloudProcess};
pub use engine::{LocalSearchConfig, LocalSearchEngine};
pub use generator::generate;
pub use score::{HardSoftScore, ScoreParseError};
