//! Probability Sources
//!
//! A probability source turns a cost polynomial and a parameter vector into
//! a probability for every basis state of an `n`-bit register. Entry `i`
//! of the returned vector belongs to the bitstring of `i` with variable 0
//! as the most significant bit, the same layout
//! [`SolverResults::from_probabilities`](crate::evaluation::SolverResults::from_probabilities)
//! expects.
//!
//! Gate-based backends implement [`ProbabilitySource`] outside this crate.
//! [`GibbsSampler`] is the classical source shipped here: the exact
//! Boltzmann distribution of the cost function at temperature `T`.
//!
//! ```text
//! p(x) = exp(-(H(x) - H_min) / T) / Z
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;

/// Default enumeration limit (2^20 basis states)
pub const DEFAULT_MAX_VARIABLES: usize = 20;

/// Below this many basis states energies are computed sequentially
const PARALLEL_THRESHOLD: usize = 1 << 12;

/// Produces a distribution over bitstrings for a cost function
pub trait ProbabilitySource: Send + Sync {
    /// Short backend name
    fn name(&self) -> &str;

    /// Probability of every basis state of an `n_vars` register
    fn probabilities(&self, cost: &Polynomial, n_vars: usize, params: &[f64]) -> Result<Vec<f64>>;
}

/// Exact Boltzmann distribution by full enumeration
#[derive(Debug, Clone)]
pub struct GibbsSampler {
    /// Largest register that will be enumerated
    pub max_variables: usize,
}

impl Default for GibbsSampler {
    fn default() -> Self {
        Self {
            max_variables: DEFAULT_MAX_VARIABLES,
        }
    }
}

impl GibbsSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set enumeration limit
    pub fn with_max_variables(mut self, max_variables: usize) -> Self {
        self.max_variables = max_variables;
        self
    }

    /// Cost of every basis state
    pub fn energies(&self, cost: &Polynomial, n_vars: usize) -> Result<Vec<f64>> {
        if n_vars > self.max_variables {
            return Err(QHyperError::TooManyVariables {
                n_vars,
                limit: self.max_variables,
            });
        }
        if cost.num_variables() > n_vars {
            return Err(QHyperError::InvalidParameters(format!(
                "cost uses {} variables but the register has {}",
                cost.num_variables(),
                n_vars
            )));
        }

        let dim = 1usize << n_vars;
        let energies = if dim >= PARALLEL_THRESHOLD {
            (0..dim)
                .into_par_iter()
                .map(|i| cost.evaluate_index(i, n_vars))
                .collect()
        } else {
            (0..dim).map(|i| cost.evaluate_index(i, n_vars)).collect()
        };
        Ok(energies)
    }
}

impl ProbabilitySource for GibbsSampler {
    fn name(&self) -> &str {
        "gibbs"
    }

    /// `params[0]` is the temperature
    fn probabilities(&self, cost: &Polynomial, n_vars: usize, params: &[f64]) -> Result<Vec<f64>> {
        let temperature = match params.first() {
            Some(&t) if t.is_finite() && t > 0.0 => t,
            Some(&t) => {
                return Err(QHyperError::InvalidParameters(format!(
                    "temperature must be positive, got {}",
                    t
                )))
            }
            None => {
                return Err(QHyperError::InvalidParameters(
                    "missing temperature parameter".into(),
                ))
            }
        };

        let energies = self.energies(cost, n_vars)?;
        let e_min = energies.iter().copied().fold(f64::INFINITY, f64::min);

        let mut probs: Vec<f64> = energies
            .iter()
            .map(|e| (-(e - e_min) / temperature).exp())
            .collect();
        let z: f64 = probs.iter().sum();
        for p in probs.iter_mut() {
            *p /= z;
        }

        debug!(n_vars, temperature, e_min, "gibbs distribution");
        Ok(probs)
    }
}
