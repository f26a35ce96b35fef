use std::env;
use std::path::Path;

use tracing::warn;

use crate::error::SolverHubError;

use super::types::{ManagerConfig, PoolSizing, QueuePolicy, RetentionPolicy};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled<F>(lookup: &F, profile: &str, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !profile.is_empty() {
        if let Some(v) = lookup(&format!("{}_{}", profile, key)) {
            return Some(v);
        }
    }
    lookup(key)
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw, "ignoring unparseable config override");
            None
        }
    }
}

impl ManagerConfig {
    /// Parse config from a TOML string, then apply env overrides.
    pub fn from_toml(toml_str: &str) -> Result<Self, SolverHubError> {
        Self::from_toml_with(toml_str, env_opt)
    }

    /// Parse config from a TOML string, then apply overrides read through `lookup`.
    pub fn from_toml_with<F>(toml_str: &str, lookup: F) -> Result<Self, SolverHubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: Self = toml::from_str(toml_str)?;
        let config = config.with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SolverHubError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, SolverHubError> {
        Self::from_lookup(env_opt)
    }

    /// Build config from defaults plus overrides read through `lookup`.
    ///
    /// Profile is read from `SOLVERHUB_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SolverHubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::default().with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply `SOLVERHUB_*` overrides on top of this config.
    ///
    /// - `SOLVERHUB_POOL_SIZING`: `8`, `cores`, `cores*10`, `cores-2`
    /// - `SOLVERHUB_QUEUE_CAPACITY`: `0` = unbounded, otherwise bounded
    /// - `SOLVERHUB_RETENTION_SECS`: unset/`forever` keeps jobs forever
    /// - `SOLVERHUB_EVENT_CAPACITY`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("SOLVERHUB_PROFILE")
            .map(|p| p.to_uppercase())
            .unwrap_or_default();
        let p = profile.as_str();

        if let Some(raw) = profiled(&lookup, p, "SOLVERHUB_POOL_SIZING") {
            if let Some(sizing) = parse_or_warn::<PoolSizing>("SOLVERHUB_POOL_SIZING", &raw) {
                self.pool.sizing = sizing;
            }
        }
        if let Some(raw) = profiled(&lookup, p, "SOLVERHUB_QUEUE_CAPACITY") {
            if let Some(capacity) = parse_or_warn::<usize>("SOLVERHUB_QUEUE_CAPACITY", &raw) {
                self.pool.queue = match capacity {
                    0 => QueuePolicy::Unbounded,
                    capacity => QueuePolicy::Bounded { capacity },
                };
            }
        }
        if let Some(raw) = profiled(&lookup, p, "SOLVERHUB_RETENTION_SECS") {
            if raw.trim().eq_ignore_ascii_case("forever") {
                self.retention = RetentionPolicy::Forever;
            } else if let Some(seconds) = parse_or_warn::<u64>("SOLVERHUB_RETENTION_SECS", &raw) {
                self.retention = RetentionPolicy::AfterTerminal { seconds };
            }
        }
        if let Some(raw) = profiled(&lookup, p, "SOLVERHUB_EVENT_CAPACITY") {
            if let Some(capacity) = parse_or_warn::<usize>("SOLVERHUB_EVENT_CAPACITY", &raw) {
                self.event_capacity = capacity;
            }
        }
        self
    }
}
