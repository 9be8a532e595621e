//! Combinatorial Optimization Problems
//!
//! Every problem knows three things:
//! - its cost function as a binary polynomial (minimisation form),
//! - its constraints as penalty polynomials that vanish on feasible
//!   assignments,
//! - how to score a decoded bitstring, returning the caller's `penalty`
//!   for infeasible solutions.
//!
//! Problems are built directly or from a JSON configuration tagged by
//! `"type"`:
//!
//! ```json
//! {"type": "knapsack", "items": [[1, 2], [1, 1]], "max_weight": 2}
//! ```

pub mod knapsack;
pub mod maxcut;
pub mod tsp;
pub mod workflow;

use serde::{Deserialize, Serialize};

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;

pub use knapsack::{Item, KnapsackProblem};
pub use maxcut::{Edge, Graph, MaxCutProblem};
pub use tsp::TspProblem;
pub use workflow::WorkflowSchedulingProblem;

// =============================================================================
// Problem Trait
// =============================================================================

/// A problem that can be turned into a cost polynomial and can score
/// solver output
pub trait Problem: Send + Sync {
    /// Registry name of the problem type
    fn name(&self) -> &str;

    /// Number of binary variables (bitstring length)
    fn num_variables(&self) -> usize;

    /// Cost function to minimise
    fn objective(&self) -> Polynomial;

    /// Penalty polynomials, zero on feasible assignments
    fn constraints(&self) -> Vec<Polynomial>;

    /// Number of constraint penalties
    fn num_constraints(&self) -> usize {
        self.constraints().len()
    }

    /// Score of a decoded bitstring, or `penalty` if it is infeasible.
    /// Lower is better.
    fn get_score(&self, bitstring: &str, penalty: f64) -> f64;
}

// =============================================================================
// Configuration
// =============================================================================

/// Problem description, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProblemConfig {
    /// Items as `[weight, value]` pairs
    Knapsack { items: Vec<(usize, f64)>, max_weight: usize },
    /// Undirected edges as `[u, v]` or `[u, v, weight]`
    Maxcut {
        num_vertices: Option<usize>,
        edges: Vec<Vec<f64>>,
    },
    /// Square distance matrix
    Tsp { distances: Vec<Vec<f64>> },
    /// Per task cost and time on every machine
    WorkflowScheduling {
        cost: Vec<Vec<f64>>,
        time: Vec<Vec<f64>>,
        deadline: f64,
    },
}

/// Names accepted in the `type` field
pub const PROBLEM_TYPES: &[&str] = &["knapsack", "maxcut", "tsp", "workflow_scheduling"];

impl ProblemConfig {
    /// Parse from a JSON value, reporting unknown types by name
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let problem_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                QHyperError::ProblemConfig("Problem configuration was not provided".into())
            })?;

        if !PROBLEM_TYPES.contains(&problem_type) {
            return Err(QHyperError::ProblemConfig(format!(
                "There is no {} problem type",
                problem_type
            )));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| QHyperError::ProblemConfig(format!("{}: {}", problem_type, e)))
    }

    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

/// Build a problem from its configuration
pub fn problem_from_config(config: &ProblemConfig) -> Result<Box<dyn Problem>> {
    let problem: Box<dyn Problem> = match config {
        ProblemConfig::Knapsack { items, max_weight } => {
            let items = items
                .iter()
                .map(|&(weight, value)| Item::new(weight, value))
                .collect();
            Box::new(KnapsackProblem::new(items, *max_weight)?)
        }
        ProblemConfig::Maxcut {
            num_vertices,
            edges,
        } => Box::new(MaxCutProblem::new(Graph::from_config(
            *num_vertices,
            edges,
        )?)),
        ProblemConfig::Tsp { distances } => Box::new(TspProblem::from_rows(distances)?),
        ProblemConfig::WorkflowScheduling {
            cost,
            time,
            deadline,
        } => Box::new(WorkflowSchedulingProblem::new(
            cost.clone(),
            time.clone(),
            *deadline,
        )?),
    };
    Ok(problem)
}

pub(crate) fn bit(bitstring: &[u8], i: usize) -> bool {
    bitstring.get(i) == Some(&b'1')
}
