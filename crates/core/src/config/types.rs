use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SolverHubError;

// ── Pool sizing ───────────────────────────────────────────────

/// Formula turning the host's available parallelism into a worker count.
///
/// Textual forms (used in TOML and env vars):
/// - `"8"` → `Fixed(8)`
/// - `"cores"` → `PerCore(1)`, `"cores*10"` → `PerCore(10)`
/// - `"cores-2"` → `CoreOffset(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PoolSizing {
    /// Exactly this many workers.
    Fixed(usize),
    /// Available cores multiplied by this factor.
    PerCore(usize),
    /// Available cores minus this offset, never below one.
    CoreOffset(usize),
}

impl Default for PoolSizing {
    fn default() -> Self {
        PoolSizing::CoreOffset(2)
    }
}

impl PoolSizing {
    /// Resolve against an explicit core count. Always at least 1.
    pub fn resolve(&self, available: usize) -> usize {
        let n = match *self {
            PoolSizing::Fixed(n) => n,
            PoolSizing::PerCore(k) => available.saturating_mul(k),
            PoolSizing::CoreOffset(d) => available.saturating_sub(d),
        };
        n.max(1)
    }

    /// Resolve against `std::thread::available_parallelism()`.
    pub fn resolved(&self) -> usize {
        self.resolve(available_cores())
    }
}

/// Number of execution units the OS reports, 4 when unknown.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl fmt::Display for PoolSizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolSizing::Fixed(n) => write!(f, "{n}"),
            PoolSizing::PerCore(1) => f.write_str("cores"),
            PoolSizing::PerCore(k) => write!(f, "cores*{k}"),
            PoolSizing::CoreOffset(d) => write!(f, "cores-{d}"),
        }
    }
}

impl FromStr for PoolSizing {
    type Err = SolverHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || SolverHubError::Config(format!("invalid pool sizing '{s}'"));

        if let Ok(n) = s.parse::<usize>() {
            return Ok(PoolSizing::Fixed(n));
        }
        let rest = s.strip_prefix("cores").ok_or_else(invalid)?;
        if rest.is_empty() {
            return Ok(PoolSizing::PerCore(1));
        }
        if let Some(k) = rest.strip_prefix('*') {
            return k.parse().map(PoolSizing::PerCore).map_err(|_| invalid());
        }
        if let Some(d) = rest.strip_prefix('-') {
            return d.parse().map(PoolSizing::CoreOffset).map_err(|_| invalid());
        }
        Err(invalid())
    }
}

impl TryFrom<String> for PoolSizing {
    type Error = SolverHubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PoolSizing> for String {
    fn from(value: PoolSizing) -> Self {
        value.to_string()
    }
}

// ── Queue policy ──────────────────────────────────────────────

/// What happens to work submitted while every worker is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Wait in an unbounded queue.
    #[default]
    Unbounded,
    /// Wait in a queue of at most `capacity` entries; reject beyond that.
    Bounded { capacity: usize },
}

impl QueuePolicy {
    pub fn capacity(&self) -> Option<usize> {
        match self {
            QueuePolicy::Unbounded => None,
            QueuePolicy::Bounded { capacity } => Some(*capacity),
        }
    }
}

// ── Retention ─────────────────────────────────────────────────

/// How long a terminal job stays queryable (and keeps its tenant id taken).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Never evict; an id stays taken for the life of the process.
    #[default]
    Forever,
    /// Evict once the job has been terminal for this many seconds.
    AfterTerminal { seconds: u64 },
}

impl RetentionPolicy {
    pub fn retention(&self) -> Option<Duration> {
        match self {
            RetentionPolicy::Forever => None,
            RetentionPolicy::AfterTerminal { seconds } => Some(Duration::from_secs(*seconds)),
        }
    }
}

// ── Pool / manager config ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub sizing: PoolSizing,
    #[serde(default)]
    pub queue: QueuePolicy,
}

impl PoolConfig {
    pub fn resolved_worker_threads(&self) -> usize {
        self.sizing.resolved()
    }
}

/// Top-level configuration for a `SolverManager`, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Buffered lifecycle events per subscriber before the oldest are dropped.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize { 256 }

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            retention: RetentionPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ManagerConfig {
    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Solver manager config:");
        tracing::info!(
            "  pool:       sizing={} ({} workers), queue={:?}",
            self.pool.sizing,
            self.pool.resolved_worker_threads(),
            self.pool.queue
        );
        tracing::info!("  retention:  {:?}", self.retention);
        tracing::info!("  events:     capacity={}", self.event_capacity);
    }
}
