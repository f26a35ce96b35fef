//! Shared fixtures for solver manager integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::thread;
use std::time::{Duration, Instant};

use solverhub_manager::{
    Engine, EngineError, JobStatus, ManagerConfig, PoolConfig, PoolSizing, QueuePolicy,
    SolverManager, TenantId,
};

pub const TIMEOUT: Duration = Duration::from_secs(20);

/// What a [`ScriptedEngine`] does when asked to solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    /// Improve every millisecond, return after this long.
    FinishAfter(Duration),
    /// Improve until an early stop is requested (or the safety cap hits).
    UntilStopped,
    Fail(String),
    Panic(String),
}

/// Test problem: a label to identify it and the behaviour to run.
#[derive(Debug, Clone, PartialEq)]
pub struct TestProblem {
    pub label: String,
    pub script: Script,
    /// Number of improvement steps taken; 0 in a fresh problem.
    pub steps: u64,
}

impl TestProblem {
    pub fn new(label: &str, script: Script) -> Self {
        Self {
            label: label.to_string(),
            script,
            steps: 0,
        }
    }
}

/// Engine whose behaviour is dictated by the problem it is given.
#[derive(Default)]
pub struct ScriptedEngine {
    best: RwLock<Option<TestProblem>>,
    solving: AtomicBool,
    stop: AtomicBool,
}

struct SolvingFlag<'a>(&'a AtomicBool);

impl Drop for SolvingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Engine for ScriptedEngine {
    type Solution = TestProblem;
    type Score = i64;

    fn solve(&self, problem: TestProblem) -> Result<(), EngineError> {
        self.solving.store(true, Ordering::SeqCst);
        let _flag = SolvingFlag(&self.solving);

        let limit = match &problem.script {
            Script::FinishAfter(d) => *d,
            Script::UntilStopped => Duration::from_secs(120),
            Script::Fail(msg) => return Err(EngineError::Failed(msg.clone())),
            Script::Panic(msg) => panic!("{}", msg),
        };

        let start = Instant::now();
        let mut current = problem;
        while !self.stop.load(Ordering::SeqCst) && start.elapsed() < limit {
            current.steps += 1;
            *self.best.write().unwrap() = Some(current.clone());
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn best_solution(&self) -> Option<TestProblem> {
        self.best.read().unwrap().clone()
    }

    fn best_score(&self) -> Option<i64> {
        self.best.read().unwrap().as_ref().map(|p| p.steps as i64)
    }

    fn is_solving(&self) -> bool {
        self.solving.load(Ordering::SeqCst)
    }

    fn is_terminating_early(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn request_early_stop(&self) -> bool {
        !self.stop.swap(true, Ordering::SeqCst)
    }
}

pub type TestManager = SolverManager<fn() -> ScriptedEngine>;

pub fn manager_with(workers: usize, queue: QueuePolicy) -> TestManager {
    let config = ManagerConfig {
        pool: PoolConfig {
            sizing: PoolSizing::Fixed(workers),
            queue,
        },
        ..ManagerConfig::default()
    };
    manager_from(config)
}

pub fn manager_from(config: ManagerConfig) -> TestManager {
    SolverManager::new(config, ScriptedEngine::default as fn() -> ScriptedEngine).unwrap()
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::from(id)
}

/// Poll until `pred` holds for the tenant's status, or panic after [`TIMEOUT`].
pub fn wait_for_status(
    manager: &TestManager,
    tenant_id: &TenantId,
    pred: impl Fn(JobStatus) -> bool,
) -> JobStatus {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        let status = manager.status(tenant_id).unwrap();
        if pred(status) {
            return status;
        }
        assert!(
            Instant::now() < deadline,
            "tenant {} stuck in {:?}",
            tenant_id,
            status
        );
        thread::sleep(Duration::from_millis(5));
    }
}

pub fn wait_until_stopped(manager: &TestManager, tenant_id: &TenantId) {
    wait_for_status(manager, tenant_id, |s| s == JobStatus::Stopped);
}
