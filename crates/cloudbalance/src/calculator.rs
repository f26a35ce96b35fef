//! Incremental score bookkeeping for the cloud balancing constraints.
//!
//! Hard: for every computer and every capacity dimension, usage above
//! capacity counts as `capacity - used`. Soft: every assigned process
//! costs its computer's `cost`. Unassigned processes contribute nothing.

use crate::domain::{CloudBalance, CloudComputer, CloudProcess};
use crate::score::HardSoftScore;

/// A process references a computer id that is not part of the problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("process {process} is assigned to unknown computer {computer}")]
pub struct UnknownComputer {
    pub process: u64,
    pub computer: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Usage {
    cpu: i64,
    memory: i64,
    network: i64,
}

impl Usage {
    fn of(process: &CloudProcess) -> Self {
        Self {
            cpu: process.required_cpu_power,
            memory: process.required_memory,
            network: process.required_network_bandwidth,
        }
    }

    fn plus(self, other: Usage) -> Self {
        Self {
            cpu: self.cpu + other.cpu,
            memory: self.memory + other.memory,
            network: self.network + other.network,
        }
    }

    fn minus(self, other: Usage) -> Self {
        Self {
            cpu: self.cpu - other.cpu,
            memory: self.memory - other.memory,
            network: self.network - other.network,
        }
    }

    fn hard_penalty(self, computer: &CloudComputer) -> i64 {
        let over = |capacity: i64, used: i64| (capacity - used).min(0);
        over(computer.cpu_power, self.cpu)
            + over(computer.memory, self.memory)
            + over(computer.network_bandwidth, self.network)
    }
}

/// Working assignment over computer indices, with the score kept current.
pub struct ScoreCalculator<'a> {
    computers: &'a [CloudComputer],
    processes: &'a [CloudProcess],
    demand: Vec<Usage>,
    assignment: Vec<Option<usize>>,
    usage: Vec<Usage>,
    score: HardSoftScore,
}

impl<'a> ScoreCalculator<'a> {
    /// Start from the assignment already present in `balance`.
    pub fn new(balance: &'a CloudBalance) -> Result<Self, UnknownComputer> {
        let computers = balance.computers.as_slice();
        let processes = balance.processes.as_slice();
        let mut calc = Self {
            computers,
            processes,
            demand: processes.iter().map(Usage::of).collect(),
            assignment: vec![None; processes.len()],
            usage: vec![Usage::default(); computers.len()],
            score: HardSoftScore::ZERO,
        };
        for (p, process) in processes.iter().enumerate() {
            if let Some(id) = process.computer_id {
                let c = computers
                    .iter()
                    .position(|computer| computer.id == id)
                    .ok_or(UnknownComputer {
                        process: process.id,
                        computer: id,
                    })?;
                calc.assign(p, Some(c));
            }
        }
        Ok(calc)
    }

    pub fn score(&self) -> HardSoftScore {
        self.score
    }

    pub fn computer_count(&self) -> usize {
        self.computers.len()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Index of the computer hosting process `p`.
    pub fn assignment(&self, p: usize) -> Option<usize> {
        self.assignment[p]
    }

    fn contribution(&self, c: usize, usage: Usage) -> HardSoftScore {
        HardSoftScore::of(usage.hard_penalty(&self.computers[c]), 0)
    }

    fn cost(&self, c: Option<usize>) -> i64 {
        c.map_or(0, |c| self.computers[c].cost)
    }

    /// Score the solution would have if process `p` moved to `to`.
    pub fn score_after_change(&self, p: usize, to: Option<usize>) -> HardSoftScore {
        let from = self.assignment[p];
        if from == to {
            return self.score;
        }
        let d = self.demand[p];
        let mut score = self.score;
        if let Some(a) = from {
            score = score - self.contribution(a, self.usage[a])
                + self.contribution(a, self.usage[a].minus(d));
        }
        if let Some(b) = to {
            score = score - self.contribution(b, self.usage[b])
                + self.contribution(b, self.usage[b].plus(d));
        }
        score + HardSoftScore::of(0, self.cost(from) - self.cost(to))
    }

    /// Score the solution would have if processes `p` and `q` traded computers.
    pub fn score_after_swap(&self, p: usize, q: usize) -> HardSoftScore {
        let (a, b) = (self.assignment[p], self.assignment[q]);
        let (Some(a), Some(b)) = (a, b) else {
            return self.score;
        };
        if a == b {
            return self.score;
        }
        let (dp, dq) = (self.demand[p], self.demand[q]);
        let new_a = self.usage[a].minus(dp).plus(dq);
        let new_b = self.usage[b].minus(dq).plus(dp);
        // Costs are per process on each side, so a swap leaves soft unchanged.
        self.score - self.contribution(a, self.usage[a]) - self.contribution(b, self.usage[b])
            + self.contribution(a, new_a)
            + self.contribution(b, new_b)
    }

    pub fn assign(&mut self, p: usize, to: Option<usize>) {
        self.score = self.score_after_change(p, to);
        let d = self.demand[p];
        if let Some(a) = self.assignment[p] {
            self.usage[a] = self.usage[a].minus(d);
        }
        if let Some(b) = to {
            self.usage[b] = self.usage[b].plus(d);
        }
        self.assignment[p] = to;
    }

    pub fn swap(&mut self, p: usize, q: usize) {
        let (a, b) = (self.assignment[p], self.assignment[q]);
        self.assign(p, b);
        self.assign(q, a);
    }

    /// Copy the current assignment and score into `target`.
    ///
    /// `target` must hold the same computers and processes, in the same
    /// order, as the balance this calculator was built from.
    pub fn write_to(&self, target: &mut CloudBalance) {
        for (process, assigned) in target.processes.iter_mut().zip(&self.assignment) {
            process.computer_id = assigned.map(|c| self.computers[c].id);
        }
        target.score = Some(self.score);
    }
}

/// Score a balance from scratch. Unknown computer ids are ignored.
pub fn score_of(balance: &CloudBalance) -> HardSoftScore {
    let mut hard = 0;
    let mut soft = 0;
    for computer in &balance.computers {
        let used = balance
            .processes
            .iter()
            .filter(|p| p.computer_id == Some(computer.id))
            .fold(Usage::default(), |acc, p| acc.plus(Usage::of(p)));
        hard += used.hard_penalty(computer);
        soft -= balance
            .processes
            .iter()
            .filter(|p| p.computer_id == Some(computer.id))
            .count() as i64
            * computer.cost;
    }
    HardSoftScore::of(hard, soft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance() -> CloudBalance {
        CloudBalance::new(
            0,
            vec![
                CloudComputer::new(10, 10, 10, 10, 5),
                CloudComputer::new(20, 4, 4, 4, 1),
            ],
            vec![
                CloudProcess::new(0, 6, 6, 6),
                CloudProcess::new(1, 3, 3, 3),
                CloudProcess::new(2, 2, 2, 2),
            ],
        )
    }

    #[test]
    fn test_single_overloaded_computer() {
        let mut b = CloudBalance::new(
            0,
            vec![CloudComputer::new(0, 1000, 1, 1, 1)],
            vec![CloudProcess::new(0, 700, 5, 5)],
        );
        b.processes[0].computer_id = Some(0);
        assert_eq!(score_of(&b), HardSoftScore::of(-8, -1));
        assert_eq!(ScoreCalculator::new(&b).unwrap().score(), HardSoftScore::of(-8, -1));
    }

    #[test]
    fn test_unassigned_contributes_nothing() {
        let b = balance();
        let calc = ScoreCalculator::new(&b).unwrap();
        assert_eq!(calc.score(), HardSoftScore::ZERO);
        assert_eq!(score_of(&b), HardSoftScore::ZERO);
    }

    #[test]
    fn test_unknown_computer_is_rejected() {
        let mut b = balance();
        b.processes[1].computer_id = Some(99);
        let err = ScoreCalculator::new(&b).err().unwrap();
        assert_eq!(err, UnknownComputer { process: 1, computer: 99 });
    }

    #[test]
    fn test_incremental_matches_full_recalculation() {
        let source = balance();
        let mut calc = ScoreCalculator::new(&source).unwrap();
        let moves: &[(usize, Option<usize>)] = &[
            (0, Some(1)),
            (1, Some(1)),
            (2, Some(0)),
            (0, Some(0)),
            (1, None),
            (2, Some(1)),
        ];
        for &(p, to) in moves {
            let predicted = calc.score_after_change(p, to);
            calc.assign(p, to);
            assert_eq!(calc.score(), predicted);

            let mut snapshot = source.clone();
            calc.write_to(&mut snapshot);
            assert_eq!(score_of(&snapshot), calc.score());
            assert_eq!(snapshot.score, Some(calc.score()));
        }
    }

    #[test]
    fn test_swap_prediction_and_application() {
        let source = balance();
        let mut calc = ScoreCalculator::new(&source).unwrap();
        calc.assign(0, Some(1));
        calc.assign(1, Some(0));
        calc.assign(2, Some(0));

        let predicted = calc.score_after_swap(0, 1);
        calc.swap(0, 1);
        assert_eq!(calc.score(), predicted);
        assert_eq!(calc.assignment(0), Some(0));
        assert_eq!(calc.assignment(1), Some(1));

        let mut snapshot = source.clone();
        calc.write_to(&mut snapshot);
        assert_eq!(score_of(&snapshot), calc.score());
        assert_eq!(calc.score_after_swap(1, 1), calc.score());
    }
}
