//! Probability-based objective
//!
//! Connects a problem, a probability source and the weighted average
//! evaluator into one scalar function of the optimisation arguments:
//!
//! ```text
//! opt_args = [w_0, w_1 .. w_m | θ_0 .. θ_k]
//!             └ penalty weights ┘ └ source parameters ┘
//!
//! f(opt_args) = weighted_avg( source(H_w, θ), problem.get_score )
//! ```
//!
//! The objective and constraints of the problem are built once and reused
//! for every weight vector.

use std::sync::Arc;

use crate::converter::Converter;
use crate::error::{QHyperError, Result};
use crate::evaluation::{weighted_avg_evaluation, EvaluationConfig, SolverResults};
use crate::polynomial::Polynomial;
use crate::problems::Problem;
use crate::sampler::ProbabilitySource;

/// Scalar objective over penalty weights and source parameters
#[derive(Clone)]
pub struct ProbabilityObjective {
    problem: Arc<dyn Problem>,
    source: Arc<dyn ProbabilitySource>,
    evaluation: EvaluationConfig,
    objective: Polynomial,
    constraints: Vec<Polynomial>,
}

impl ProbabilityObjective {
    pub fn new(
        problem: Arc<dyn Problem>,
        source: Arc<dyn ProbabilitySource>,
        evaluation: EvaluationConfig,
    ) -> Self {
        let objective = problem.objective();
        let constraints = problem.constraints();
        Self {
            problem,
            source,
            evaluation,
            objective,
            constraints,
        }
    }

    pub fn problem(&self) -> &dyn Problem {
        self.problem.as_ref()
    }

    pub fn evaluation(&self) -> &EvaluationConfig {
        &self.evaluation
    }

    /// Number of leading weight entries in `opt_args`
    pub fn n_weights(&self) -> usize {
        1 + self.constraints.len()
    }

    /// Split `opt_args` into (weights, source parameters)
    pub fn split_args<'a>(&self, opt_args: &'a [f64]) -> Result<(&'a [f64], &'a [f64])> {
        let n = self.n_weights();
        if opt_args.len() < n {
            return Err(QHyperError::WeightCountMismatch {
                expected: n,
                got: opt_args.len(),
            });
        }
        Ok(opt_args.split_at(n))
    }

    /// Cost polynomial for a weight vector
    pub fn cost(&self, weights: &[f64]) -> Result<Polynomial> {
        Converter::combine(&self.objective, &self.constraints, weights)
    }

    /// Distribution produced by the source
    pub fn results(&self, weights: &[f64], params: &[f64]) -> Result<SolverResults> {
        let cost = self.cost(weights)?;
        let n_vars = self.problem.num_variables();
        let probs = self.source.probabilities(&cost, n_vars, params)?;
        SolverResults::from_probabilities(&probs, n_vars)
    }

    /// Weighted average score of the source's distribution
    pub fn evaluate(&self, weights: &[f64], params: &[f64]) -> Result<f64> {
        let results = self.results(weights, params)?;
        let problem = self.problem.as_ref();
        weighted_avg_evaluation(&results, |x, p| problem.get_score(x, p), &self.evaluation)
    }

    /// Evaluate concatenated `[weights | params]`
    pub fn evaluate_args(&self, opt_args: &[f64]) -> Result<f64> {
        let (weights, params) = self.split_args(opt_args)?;
        self.evaluate(weights, params)
    }
}
