//! Problem to cost polynomial conversion
//!
//! ```text
//! H(x) = w_0 · objective(x) + Σ_i w_{i+1} · constraint_i(x)
//! ```

use tracing::debug;

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;
use crate::problems::Problem;

/// Combines a problem's objective and constraint penalties
pub struct Converter;

impl Converter {
    /// Number of weights a problem expects
    pub fn weights_len(problem: &dyn Problem) -> usize {
        1 + problem.num_constraints()
    }

    /// Build the weighted cost polynomial. An empty `weights` slice
    /// weighs every part with 1.
    pub fn create_cost_polynomial(problem: &dyn Problem, weights: &[f64]) -> Result<Polynomial> {
        let cost = Self::combine(&problem.objective(), &problem.constraints(), weights)?;
        debug!(
            problem = problem.name(),
            terms = cost.n_terms(),
            degree = cost.degree(),
            "built cost polynomial"
        );
        Ok(cost)
    }

    /// Weighted sum of an objective and its constraint penalties
    pub fn combine(
        objective: &Polynomial,
        constraints: &[Polynomial],
        weights: &[f64],
    ) -> Result<Polynomial> {
        let expected = 1 + constraints.len();

        let weights = if weights.is_empty() {
            vec![1.0; expected]
        } else {
            weights.to_vec()
        };
        if weights.len() != expected {
            return Err(QHyperError::WeightCountMismatch {
                expected,
                got: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(QHyperError::InvalidParameters(format!(
                "weights must be finite: {:?}",
                weights
            )));
        }

        let mut cost = objective.scale(weights[0]);
        for (constraint, &w) in constraints.iter().zip(&weights[1..]) {
            cost += &constraint.scale(w);
        }
        Ok(cost)
    }
}
