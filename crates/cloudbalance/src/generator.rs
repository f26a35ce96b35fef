use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::{CloudBalance, CloudComputer, CloudProcess};

/// Random unassigned problem. The same seed always yields the same problem.
///
/// Capacities and demands are drawn from `0..10`; computer cost is a
/// multiple of ten below 100. The balance id is the seed.
pub fn generate(computers: usize, processes: usize, seed: u64) -> CloudBalance {
    let mut rng = StdRng::seed_from_u64(seed);

    let computers: Vec<CloudComputer> = (0..computers as u64)
        .map(|id| {
            CloudComputer::new(
                id,
                rng.gen_range(0..10),
                rng.gen_range(0..10),
                rng.gen_range(0..10),
                rng.gen_range(0..10) * 10,
            )
        })
        .collect();
    let processes: Vec<CloudProcess> = (0..processes as u64)
        .map(|id| {
            CloudProcess::new(
                id,
                rng.gen_range(0..10),
                rng.gen_range(0..10),
                rng.gen_range(0..10),
            )
        })
        .collect();

    debug!(
        seed,
        computers = computers.len(),
        processes = processes.len(),
        "Generated cloud balancing problem"
    );
    CloudBalance::new(seed, computers, processes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_problem() {
        assert_eq!(generate(4, 12, 47), generate(4, 12, 47));
        assert_ne!(generate(4, 12, 47), generate(4, 12, 48));
    }

    #[test]
    fn test_shape_and_ranges() {
        let balance = generate(3, 20, 1);
        assert_eq!(balance.id, 1);
        assert_eq!(balance.computers.len(), 3);
        assert_eq!(balance.processes.len(), 20);
        assert_eq!(balance.unassigned_count(), 20);
        assert!(balance.score.is_none());
        for c in &balance.computers {
            assert!((0..10).contains(&c.cpu_power));
            assert_eq!(c.cost % 10, 0);
            assert!(c.cost < 100);
        }
        let ids: Vec<u64> = balance.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }
}
