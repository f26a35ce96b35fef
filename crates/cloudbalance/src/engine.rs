//! Seeded local search over process-to-computer assignments.
//!
//! A construction heuristic places every unassigned process (largest
//! demand first) on the computer that scores best, then a late-acceptance
//! search applies random change and swap moves until its termination
//! policy fires or an early stop is requested.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use solverhub_manager::{Engine, EngineError, EngineFactory};

use crate::calculator::ScoreCalculator;
use crate::domain::CloudBalance;
use crate::score::HardSoftScore;

fn default_time_limit_ms() -> Option<u64> {
    Some(30_000)
}

fn default_unimproved_time_limit_ms() -> Option<u64> {
    Some(5_000)
}

fn default_seed() -> u64 {
    0
}

fn default_late_acceptance_size() -> usize {
    400
}

/// Termination policy and search knobs shared by every engine built from it.
///
/// `None` disables a limit. With every limit disabled the search runs
/// until an early stop is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSearchConfig {
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: Option<u64>,
    /// Stop when the best score has not improved for this long.
    #[serde(default = "default_unimproved_time_limit_ms")]
    pub unimproved_time_limit_ms: Option<u64>,
    #[serde(default)]
    pub step_limit: Option<u64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_late_acceptance_size")]
    pub late_acceptance_size: usize,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: default_time_limit_ms(),
            unimproved_time_limit_ms: default_unimproved_time_limit_ms(),
            step_limit: None,
            seed: default_seed(),
            late_acceptance_size: default_late_acceptance_size(),
        }
    }
}

impl LocalSearchConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn unimproved_time_limit(&self) -> Option<Duration> {
        self.unimproved_time_limit_ms.map(Duration::from_millis)
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = Some(steps);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl EngineFactory for LocalSearchConfig {
    type Engine = LocalSearchEngine;

    fn build(&self) -> LocalSearchEngine {
        LocalSearchEngine::new(self.clone())
    }
}

/// Why the local search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    EarlyStop,
    TimeLimit,
    Unimproved,
    StepLimit,
}

#[derive(Debug, Clone, Copy)]
enum Move {
    /// Move a process to a computer.
    Change(usize, usize),
    /// Trade the computers of two processes.
    Swap(usize, usize),
}

impl Move {
    fn score(self, calc: &ScoreCalculator<'_>) -> HardSoftScore {
        match self {
            Move::Change(p, to) => calc.score_after_change(p, Some(to)),
            Move::Swap(p, q) => calc.score_after_swap(p, q),
        }
    }

    fn apply(self, calc: &mut ScoreCalculator<'_>) {
        match self {
            Move::Change(p, to) => calc.assign(p, Some(to)),
            Move::Swap(p, q) => calc.swap(p, q),
        }
    }
}

/// Cloud balancing engine. One instance solves one problem.
pub struct LocalSearchEngine {
    config: LocalSearchConfig,
    best: RwLock<Option<CloudBalance>>,
    solving: AtomicBool,
    stop: AtomicBool,
    steps: AtomicU64,
}

/// Clears the solving flag when `solve` returns or unwinds.
struct SolvingGuard<'a>(&'a AtomicBool);

impl Drop for SolvingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LocalSearchEngine {
    pub fn new(config: LocalSearchConfig) -> Self {
        Self {
            config,
            best: RwLock::new(None),
            solving: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            steps: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    /// Local search steps evaluated by the last (or current) `solve`.
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    fn publish(&self, calc: &ScoreCalculator<'_>, template: &CloudBalance) {
        let mut snapshot = template.clone();
        calc.write_to(&mut snapshot);
        *self.best.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Place processes until done or interrupted. Interrupted placement
    /// leaves the remaining processes unassigned.
    fn construct(&self, calc: &mut ScoreCalculator<'_>, problem: &CloudBalance, started: Instant) {
        let mut order: Vec<usize> = (0..calc.process_count())
            .filter(|&p| calc.assignment(p).is_none())
            .collect();
        order.sort_by_key(|&p| std::cmp::Reverse(problem.processes[p].total_demand()));

        for p in order {
            if let Some(reason) = self.construction_interrupted(started) {
                debug!(problem = problem.id, ?reason, "Construction heuristic interrupted");
                return;
            }
            let mut best: Option<(usize, HardSoftScore)> = None;
            for c in 0..calc.computer_count() {
                let score = calc.score_after_change(p, Some(c));
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((c, score));
                }
            }
            if let Some((c, _)) = best {
                calc.assign(p, Some(c));
            }
        }
    }

    /// Step and unimproved limits only apply to the local search.
    fn construction_interrupted(&self, started: Instant) -> Option<StopReason> {
        if self.stop.load(Ordering::SeqCst) {
            return Some(StopReason::EarlyStop);
        }
        if self.config.time_limit().is_some_and(|limit| started.elapsed() >= limit) {
            return Some(StopReason::TimeLimit);
        }
        None
    }

    fn stop_reason(&self, started: Instant, last_improved: Instant, step: u64) -> Option<StopReason> {
        if self.stop.load(Ordering::SeqCst) {
            return Some(StopReason::EarlyStop);
        }
        if self.config.step_limit.is_some_and(|limit| step >= limit) {
            return Some(StopReason::StepLimit);
        }
        if self.config.time_limit().is_some_and(|limit| started.elapsed() >= limit) {
            return Some(StopReason::TimeLimit);
        }
        if self
            .config
            .unimproved_time_limit()
            .is_some_and(|limit| last_improved.elapsed() >= limit)
        {
            return Some(StopReason::Unimproved);
        }
        None
    }

    fn local_search(&self, calc: &mut ScoreCalculator<'_>, problem: &CloudBalance, started: Instant) {
        let computers = calc.computer_count();
        let processes = calc.process_count();
        if computers < 2 || processes == 0 {
            debug!(problem = problem.id, "No moves available, skipping local search");
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut late = vec![calc.score(); self.config.late_acceptance_size.max(1)];
        let mut best = calc.score();
        let mut last_improved = Instant::now();
        let mut step = 0u64;

        let reason = loop {
            if let Some(reason) = self.stop_reason(started, last_improved, step) {
                break reason;
            }

            let current = calc.score();
            let mv = if processes >= 2 && rng.gen_bool(0.5) {
                Move::Swap(rng.gen_range(0..processes), rng.gen_range(0..processes))
            } else {
                Move::Change(rng.gen_range(0..processes), rng.gen_range(0..computers))
            };
            let candidate = mv.score(calc);

            let slot = (step % late.len() as u64) as usize;
            if candidate >= current || candidate >= late[slot] {
                mv.apply(calc);
            }
            late[slot] = calc.score();

            if calc.score() > best {
                best = calc.score();
                last_improved = Instant::now();
                self.publish(calc, problem);
                debug!(problem = problem.id, step, score = %best, "New best solution");
            }
            step += 1;
            self.steps.store(step, Ordering::Relaxed);
        };

        info!(problem = problem.id, steps = step, ?reason, score = %best, "Local search ended");
    }
}

impl Engine for LocalSearchEngine {
    type Solution = CloudBalance;
    type Score = HardSoftScore;

    fn solve(&self, problem: CloudBalance) -> Result<(), EngineError> {
        self.solving.store(true, Ordering::SeqCst);
        let _guard = SolvingGuard(&self.solving);
        let started = Instant::now();

        if problem.computers.is_empty() && !problem.processes.is_empty() {
            return Err(EngineError::InvalidProblem(format!(
                "{} processes but no computers",
                problem.processes.len()
            )));
        }
        let mut calc = ScoreCalculator::new(&problem)
            .map_err(|e| EngineError::InvalidProblem(e.to_string()))?;

        self.construct(&mut calc, &problem, started);
        self.publish(&calc, &problem);
        info!(
            problem = problem.id,
            computers = problem.computers.len(),
            processes = problem.processes.len(),
            score = %calc.score(),
            "Construction heuristic ended"
        );

        self.local_search(&mut calc, &problem, started);
        Ok(())
    }

    fn best_solution(&self) -> Option<CloudBalance> {
        self.best.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn best_score(&self) -> Option<HardSoftScore> {
        self.best
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|b| b.score)
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
