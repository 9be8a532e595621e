//! Workflow Scheduling
//!
//! Assign every task of a workflow to one machine so that the total cost
//! is minimal and the total execution time meets the deadline.
//!
//! # Encoding
//!
//! Each task's machine index is written in `k = ceil(log2 machines)` bits,
//! most significant bit first, so task `t` owns variables
//! `t·k .. t·k + k`. For a machine code `j` the indicator
//! `I_{t,j} = Π_b (x_b if bit b of j is set else 1 - x_b)` is one exactly
//! when task `t` runs on machine `j`.
//!
//! ```text
//! objective = Σ_t Σ_j cost[t][j] · I_{t,j}
//! T(x)      = Σ_t Σ_j time[t][j] · I_{t,j}
//! h(x)      = deadline - T(x)
//!
//! constraint1 = h(x)          linear part of the unbalanced deadline penalty
//! constraint2 = h(x)²         quadratic part
//! constraint3 = Σ_t Σ_{j >= machines} I_{t,j}   unused machine codes
//! ```
//!
//! `constraint3` is only emitted when some codes name no machine, i.e. when
//! the machine count is below `2^k`.
//!
//! With a negative weight on the linear part and a positive one on the
//! quadratic part, schedules finishing early are rewarded until the slack
//! grows large, which avoids slack variables for the inequality.

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;
use crate::problems::{bit, Problem};

/// Workflow scheduling instance
#[derive(Debug, Clone)]
pub struct WorkflowSchedulingProblem {
    /// cost[task][machine]
    cost: Vec<Vec<f64>>,
    /// time[task][machine]
    time: Vec<Vec<f64>>,
    deadline: f64,
    /// Bits per task
    bits_per_task: usize,
}

impl WorkflowSchedulingProblem {
    pub fn new(cost: Vec<Vec<f64>>, time: Vec<Vec<f64>>, deadline: f64) -> Result<Self> {
        if cost.is_empty() {
            return Err(QHyperError::ProblemConfig("workflow has no tasks".into()));
        }
        if cost.len() != time.len() {
            return Err(QHyperError::ProblemConfig(format!(
                "cost has {} tasks but time has {}",
                cost.len(),
                time.len()
            )));
        }

        let machines = cost[0].len();
        if machines == 0 {
            return Err(QHyperError::ProblemConfig("workflow has no machines".into()));
        }
        if cost.iter().chain(time.iter()).any(|row| row.len() != machines) {
            return Err(QHyperError::ProblemConfig(format!(
                "every task needs cost and time for all {} machines",
                machines
            )));
        }
        if cost.iter().chain(time.iter()).flatten().any(|v| !v.is_finite())
            || !deadline.is_finite()
        {
            return Err(QHyperError::ProblemConfig(
                "workflow costs, times and deadline must be finite".into(),
            ));
        }

        let bits_per_task = (usize::BITS - (machines - 1).leading_zeros()).max(1) as usize;

        Ok(Self {
            cost,
            time,
            deadline,
            bits_per_task,
        })
    }

    pub fn n_tasks(&self) -> usize {
        self.cost.len()
    }

    pub fn n_machines(&self) -> usize {
        self.cost[0].len()
    }

    pub fn bits_per_task(&self) -> usize {
        self.bits_per_task
    }

    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    /// Machine assigned to each task, or None for an unused machine code
    pub fn decode(&self, bitstring: &str) -> Option<Vec<usize>> {
        let bits = bitstring.as_bytes();
        if bits.len() != self.num_variables() {
            return None;
        }

        (0..self.n_tasks())
            .map(|task| {
                let start = task * self.bits_per_task;
                let code = (start..start + self.bits_per_task)
                    .fold(0usize, |acc, i| (acc << 1) | bit(bits, i) as usize);
                (code < self.n_machines()).then_some(code)
            })
            .collect()
    }

    /// Total cost of an assignment
    pub fn total_cost(&self, assignment: &[usize]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(task, &machine)| self.cost[task][machine])
            .sum()
    }

    /// Total execution time of an assignment
    pub fn total_time(&self, assignment: &[usize]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(task, &machine)| self.time[task][machine])
            .sum()
    }

    fn indicator(&self, task: usize, code: usize) -> Polynomial {
        let start = task * self.bits_per_task;
        (0..self.bits_per_task).fold(Polynomial::constant(1.0), |acc, b| {
            let var = start + b;
            let shift = self.bits_per_task - 1 - b;
            let factor = if (code >> shift) & 1 == 1 {
                Polynomial::variable(var)
            } else {
                Polynomial::complement(var)
            };
            &acc * &factor
        })
    }

    /// True when some machine codes name no machine
    pub fn has_unused_codes(&self) -> bool {
        self.n_machines() < 1usize << self.bits_per_task
    }

    fn weighted_sum(&self, table: &[Vec<f64>]) -> Polynomial {
        let mut sum = Polynomial::new();
        for (task, row) in table.iter().enumerate() {
            for (machine, &value) in row.iter().enumerate() {
                sum += &self.indicator(task, machine).scale(value);
            }
        }
        sum
    }
}

impl Problem for WorkflowSchedulingProblem {
    fn name(&self) -> &str {
        "workflow_scheduling"
    }

    fn num_variables(&self) -> usize {
        self.n_tasks() * self.bits_per_task
    }

    fn objective(&self) -> Polynomial {
        self.weighted_sum(&self.cost)
    }

    fn constraints(&self) -> Vec<Polynomial> {
        let slack = Polynomial::constant(self.deadline) - self.weighted_sum(&self.time);
        let quadratic = slack.square();
        if !self.has_unused_codes() {
            return vec![slack, quadratic];
        }

        let mut unused = Polynomial::new();
        for task in 0..self.n_tasks() {
            for code in self.n_machines()..(1usize << self.bits_per_task) {
                unused += &self.indicator(task, code);
            }
        }

        vec![slack, quadratic, unused]
    }

    fn get_score(&self, bitstring: &str, penalty: f64) -> f64 {
        match self.decode(bitstring) {
            Some(assignment) if self.total_time(&assignment) <= self.deadline => {
                self.total_cost(&assignment)
            }
            _ => penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Converter;

    /// 3 tasks on 4 machines, deadline 13
    fn three_tasks() -> WorkflowSchedulingProblem {
        WorkflowSchedulingProblem::new(
            vec![
                vec![6.0, 8.0, 8.0, 2.0],
                vec![3.0, 4.0, 4.0, 1.0],
                vec![12.0, 16.0, 16.0, 4.0],
            ],
            vec![
                vec![6.0, 2.0, 4.0, 16.0],
                vec![3.0, 1.0, 2.0, 8.0],
                vec![12.0, 4.0, 8.0, 32.0],
            ],
            13.0,
        )
        .unwrap()
    }

    #[test]
    fn test_encoding_size() {
        let problem = three_tasks();
        assert_eq!(problem.bits_per_task(), 2);
        assert_eq!(problem.num_variables(), 6);

        let three_machines =
            WorkflowSchedulingProblem::new(vec![vec![1.0; 3]], vec![vec![1.0; 3]], 1.0).unwrap();
        assert_eq!(three_machines.bits_per_task(), 2);

        let one_machine =
            WorkflowSchedulingProblem::new(vec![vec![1.0]], vec![vec![1.0]], 1.0).unwrap();
        assert_eq!(one_machine.bits_per_task(), 1);
    }

    #[test]
    fn test_invalid_instances() {
        assert!(WorkflowSchedulingProblem::new(vec![], vec![], 1.0).is_err());
        assert!(WorkflowSchedulingProblem::new(vec![vec![1.0]], vec![], 1.0).is_err());
        assert!(
            WorkflowSchedulingProblem::new(vec![vec![1.0, 2.0]], vec![vec![1.0]], 1.0).is_err()
        );
        assert!(
            WorkflowSchedulingProblem::new(vec![vec![1.0]], vec![vec![1.0]], f64::NAN).is_err()
        );
    }

    #[test]
    fn test_score() {
        let problem = three_tasks();
        // time 2 + 1 + 4 = 7
        assert_eq!(problem.get_score("010101", 0.0), 28.0);
        // time 2 + 1 + 8 = 11
        assert_eq!(problem.get_score("010110", 0.0), 28.0);
        // time 6 + 3 + 12 = 21 > 13
        assert_eq!(problem.get_score("000000", -5.0), -5.0);
        assert_eq!(problem.get_score("111111", -5.0), -5.0);
    }

    #[test]
    fn test_unused_machine_code() {
        let problem =
            WorkflowSchedulingProblem::new(vec![vec![1.0, 2.0, 3.0]], vec![vec![1.0; 3]], 5.0)
                .unwrap();
        assert_eq!(problem.decode("11"), None);
        assert_eq!(problem.get_score("11", 99.0), 99.0);
        assert_eq!(problem.get_score("10", 99.0), 3.0);

        let unused = &problem.constraints()[2];
        assert_eq!(unused.evaluate(&[1, 1]), 1.0);
        assert_eq!(unused.evaluate(&[1, 0]), 0.0);
    }

    #[test]
    fn test_polynomials_match_tables() {
        let problem = three_tasks();
        let objective = problem.objective();
        let constraints = problem.constraints();

        let bits = [0, 1, 1, 0, 0, 1];
        let assignment = problem.decode("011001").unwrap();
        assert_eq!(assignment, vec![1, 2, 1]);

        let slack = problem.deadline() - problem.total_time(&assignment);
        assert!((objective.evaluate(&bits) - problem.total_cost(&assignment)).abs() < 1e-9);
        assert!((constraints[0].evaluate(&bits) - slack).abs() < 1e-9);
        assert!((constraints[1].evaluate(&bits) - slack * slack).abs() < 1e-9);
    }

    #[test]
    fn test_deadline_weights_only_for_full_code_space() {
        let problem = three_tasks();
        assert!(!problem.has_unused_codes());
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(Converter::weights_len(&problem), 3);

        // unbalanced penalty: cost - 2 h + 2 h^2
        let cost = Converter::create_cost_polynomial(&problem, &[1.0, -2.0, 2.0]).unwrap();
        let assignment = problem.decode("011001").unwrap();
        let h = problem.deadline() - problem.total_time(&assignment);
        let expected = problem.total_cost(&assignment) - 2.0 * h + 2.0 * h * h;
        assert!((cost.evaluate(&[0, 1, 1, 0, 0, 1]) - expected).abs() < 1e-9);

        let three_machines =
            WorkflowSchedulingProblem::new(vec![vec![1.0; 3]], vec![vec![1.0; 3]], 1.0).unwrap();
        assert!(three_machines.has_unused_codes());
        assert_eq!(three_machines.num_constraints(), 3);
    }
}
