use std::fmt::{Debug, Display};

/// Error returned by an engine whose search could not complete normally.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
    #[error("Search failed: {0}")]
    Failed(String),
}

/// A pluggable improving search.
///
/// `solve` blocks the calling (worker) thread until the engine's own
/// termination policy fires: a time limit, convergence, or an early-stop
/// request. Every other method must be safe to call from any thread while
/// `solve` is running, since query callers read the best result
/// concurrently with the solving thread's writes.
pub trait Engine: Send + Sync + 'static {
    /// Problem and solution share one type: a solution is the problem with
    /// its assignment filled in.
    type Solution: Clone + Send + Sync + 'static;
    type Score: Clone + Ord + Debug + Display + Send + Sync + 'static;

    /// Run the search to completion.
    fn solve(&self, problem: Self::Solution) -> Result<(), EngineError>;

    /// Best solution found so far, `None` before the first one.
    fn best_solution(&self) -> Option<Self::Solution>;

    /// Score of the best solution found so far.
    fn best_score(&self) -> Option<Self::Score>;

    fn is_solving(&self) -> bool;

    /// Whether an early stop was requested. May stay true after `solve` returns.
    fn is_terminating_early(&self) -> bool;

    /// Ask a running search to stop at its next opportunity.
    ///
    /// Returns `false` if a stop had already been requested.
    fn request_early_stop(&self) -> bool;
}

/// Builds a fresh engine per submitted job from shared, immutable settings.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: Engine;

    fn build(&self) -> Self::Engine;
}

impl<E, F> EngineFactory for F
where
    E: Engine,
    F: Fn() -> E + Send + Sync + 'static,
{
    type Engine = E;

    fn build(&self) -> E {
        self()
    }
}
