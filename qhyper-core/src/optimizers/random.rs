//! Random Search
//!
//! Draws hyperparameter vectors uniformly from `[lower, upper)` and
//! evaluates them on a dedicated thread pool. All samples are drawn from a
//! single RNG before evaluation starts, so a fixed seed gives the same
//! result for any number of threads.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{QHyperError, Result};
use crate::optimizers::{
    build_pool, log_search, validate_bounds, HyperObjective, HyperparameterSearch,
    HyperparametersOptimizer,
};

/// Default number of samples
pub const DEFAULT_SAMPLES: usize = 100;

/// Default sampling interval
pub const DEFAULT_BOUNDS: (f64, f64) = (0.0, 10.0);

/// Parallel uniform random search
#[derive(Debug, Clone)]
pub struct RandomSearch {
    /// Number of hyperparameter vectors to evaluate
    pub number_of_samples: usize,
    /// Worker threads
    pub processes: usize,
    /// Sampling interval for every dimension
    pub bounds: (f64, f64),
    /// RNG seed (None = from entropy)
    pub seed: Option<u64>,
}

impl Default for RandomSearch {
    fn default() -> Self {
        Self {
            number_of_samples: DEFAULT_SAMPLES,
            processes: rayon::current_num_threads(),
            bounds: DEFAULT_BOUNDS,
            seed: None,
        }
    }
}

impl RandomSearch {
    pub fn new(number_of_samples: usize) -> Self {
        Self {
            number_of_samples,
            ..Default::default()
        }
    }

    /// Builder: set worker threads
    pub fn with_processes(mut self, processes: usize) -> Self {
        self.processes = processes;
        self
    }

    /// Builder: set sampling interval
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = (lower, upper);
        self
    }

    /// Builder: fix the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw every sample up front
    pub fn draw_samples(&self, dim: usize) -> Vec<Vec<f64>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (lo, hi) = self.bounds;

        (0..self.number_of_samples)
            .map(|_| (0..dim).map(|_| lo + (hi - lo) * rng.gen::<f64>()).collect())
            .collect()
    }
}

impl HyperparametersOptimizer for RandomSearch {
    fn name(&self) -> &str {
        "random"
    }

    fn minimize(
        &self,
        objective: &dyn HyperObjective,
        hyperparams_init: &[f64],
    ) -> Result<HyperparameterSearch> {
        if self.number_of_samples == 0 {
            return Err(QHyperError::OptimizerConfig(
                "number_of_samples must be at least 1".into(),
            ));
        }
        if hyperparams_init.is_empty() {
            return Err(QHyperError::OptimizerConfig(
                "hyperparams_init must not be empty".into(),
            ));
        }
        validate_bounds(self.bounds)?;

        let samples = self.draw_samples(hyperparams_init.len());
        let pool = build_pool(self.processes)?;
        let done = AtomicUsize::new(0);
        let total = samples.len();

        let values = pool.install(|| {
            samples
                .par_iter()
                .map(|h| -> Result<f64> {
                    let value = objective.evaluate(h)?;
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(sample = n, total, value, params = ?h, "random search sample");
                    Ok(value)
                })
                .collect::<Result<Vec<f64>>>()
        })?;

        let search = HyperparameterSearch::from_evaluations(samples.into_iter().zip(values).collect())?;
        log_search(&search, self.name());
        Ok(search)
    }
}
