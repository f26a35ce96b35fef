#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use solverhub_core::{
        ManagerConfig, PoolConfig, PoolSizing, QueuePolicy, SolverHubError, TenantId,
    };

    use crate::engine::{Engine, EngineError};
    use crate::events::JobEventKind;
    use crate::manager::SolverManager;
    use crate::status::JobStatus;

    /// Spins until asked to stop. Solution is just a label.
    #[derive(Default)]
    struct SpinEngine {
        solving: AtomicBool,
        stop: AtomicBool,
    }

    impl Engine for SpinEngine {
        type Solution = &'static str;
        type Score = i32;

        fn solve(&self, _problem: &'static str) -> Result<(), EngineError> {
            self.solving.store(true, Ordering::SeqCst);
            let deadline = Instant::now() + Duration::from_secs(30);
            while !self.stop.load(Ordering::SeqCst) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            self.solving.store(false, Ordering::SeqCst);
            Ok(())
        }
        fn best_solution(&self) -> Option<&'static str> {
            None
        }
        fn best_score(&self) -> Option<i32> {
            None
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

    type Manager = SolverManager<fn() -> SpinEngine>;

    fn manager(workers: usize) -> Manager {
        let config = ManagerConfig {
            pool: PoolConfig {
                sizing: PoolSizing::Fixed(workers),
                queue: QueuePolicy::Unbounded,
            },
            ..ManagerConfig::default()
        };
        SolverManager::new(config, SpinEngine::default as fn() -> SpinEngine).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ManagerConfig {
            pool: PoolConfig {
                sizing: PoolSizing::Fixed(0),
                queue: QueuePolicy::Unbounded,
            },
            ..ManagerConfig::default()
        };
        let result = SolverManager::new(config, SpinEngine::default as fn() -> SpinEngine);
        assert!(matches!(result, Err(SolverHubError::Config(_))));
    }

    #[test]
    fn test_pool_refusal_rolls_back_registration() {
        let m = manager(1);
        let mut events = m.subscribe();
        // Close the pool underneath the facade.
        m.pool.shutdown();

        let err = m.submit("orphan", "p").unwrap_err();
        assert!(matches!(err, SolverHubError::ShutDown));
        assert!(m.registry.is_empty());
        assert!(matches!(m.status(&TenantId::from("orphan")), Err(SolverHubError::NotFound(_))));
        assert_eq!(m.metrics().submitted, 0);

        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], JobEventKind::Submitted);
        assert!(matches!(kinds[1], JobEventKind::Rejected { .. }));
    }

    #[test]
    fn test_anonymous_counter_is_shared_across_calls() {
        let m = manager(2);
        let a = m.submit_anonymous("a").unwrap();
        let b = m.submit_anonymous("b").unwrap();
        assert_eq!(a.as_str(), "job-0");
        assert_eq!(b.as_str(), "job-1");
        assert_eq!(m.next_anonymous_id.load(Ordering::SeqCst), 2);
        assert_eq!(m.tenants(), vec![a, b]);
        m.shutdown();
    }

    #[test]
    fn test_best_solution_falls_back_to_problem() {
        let m = manager(1);
        let t = TenantId::from("fallback");
        m.submit(t.clone(), "submitted").unwrap();
        assert_eq!(m.best_solution(&t).unwrap(), "submitted");
        assert_eq!(m.best_score(&t).unwrap(), None);
        m.shutdown();
    }

    #[test]
    fn test_drop_signals_running_jobs() {
        let m = manager(1);
        let t = TenantId::from("dropped");
        m.submit(t.clone(), "p").unwrap();
        let job = m.job(&t).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while job.status() != JobStatus::Solving {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(2));
        }

        drop(m);
        assert!(job.engine().is_terminating_early());
        while job.status() != JobStatus::Stopped {
            assert!(Instant::now() < deadline, "job kept running after drop");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_shutdown_twice_is_harmless() {
        let m = Arc::new(manager(1));
        m.shutdown();
        m.shutdown();
        assert!(m.is_shut_down());
        assert!(matches!(m.submit_anonymous("late"), Err(SolverHubError::ShutDown)));
    }
}
