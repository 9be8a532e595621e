//! Grid Search
//!
//! Evaluates the Cartesian grid of `points_per_dim` evenly spaced values
//! per dimension (both bounds included) in parallel.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{QHyperError, Result};
use crate::optimizers::random::DEFAULT_BOUNDS;
use crate::optimizers::{
    build_pool, log_search, validate_bounds, HyperObjective, HyperparameterSearch,
    HyperparametersOptimizer,
};

/// Default grid resolution per dimension
pub const DEFAULT_POINTS_PER_DIM: usize = 10;

/// Largest grid that will be evaluated
pub const MAX_GRID_POINTS: usize = 1 << 20;

/// Parallel exhaustive grid search
#[derive(Debug, Clone)]
pub struct GridSearch {
    /// Grid values per dimension
    pub points_per_dim: usize,
    /// Worker threads
    pub processes: usize,
    /// Interval covered in every dimension
    pub bounds: (f64, f64),
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            points_per_dim: DEFAULT_POINTS_PER_DIM,
            processes: rayon::current_num_threads(),
            bounds: DEFAULT_BOUNDS,
        }
    }
}

impl GridSearch {
    pub fn new(points_per_dim: usize) -> Self {
        Self {
            points_per_dim,
            ..Default::default()
        }
    }

    /// Builder: set worker threads
    pub fn with_processes(mut self, processes: usize) -> Self {
        self.processes = processes;
        self
    }

    /// Builder: set interval
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = (lower, upper);
        self
    }

    /// Values taken in one dimension
    pub fn axis(&self) -> Vec<f64> {
        let (lo, hi) = self.bounds;
        match self.points_per_dim {
            0 => Vec::new(),
            1 => vec![lo],
            n => (0..n)
                .map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64)
                .collect(),
        }
    }

    /// Every grid point, last dimension varying fastest
    pub fn grid_points(&self, dim: usize) -> Result<Vec<Vec<f64>>> {
        let total = u32::try_from(dim)
            .ok()
            .and_then(|d| self.points_per_dim.checked_pow(d))
            .filter(|&t| t <= MAX_GRID_POINTS)
            .ok_or_else(|| {
                QHyperError::OptimizerConfig(format!(
                    "grid of {}^{} points exceeds {}",
                    self.points_per_dim, dim, MAX_GRID_POINTS
                ))
            })?;

        let axis = self.axis();
        Ok((0..total)
            .map(|mut flat| {
                let mut point = vec![0.0; dim];
                for slot in point.iter_mut().rev() {
                    *slot = axis[flat % self.points_per_dim];
                    flat /= self.points_per_dim;
                }
                point
            })
            .collect())
    }
}

impl HyperparametersOptimizer for GridSearch {
    fn name(&self) -> &str {
        "grid"
    }

    fn minimize(
        &self,
        objective: &dyn HyperObjective,
        hyperparams_init: &[f64],
    ) -> Result<HyperparameterSearch> {
        if self.points_per_dim == 0 {
            return Err(QHyperError::OptimizerConfig(
                "points_per_dim must be at least 1".into(),
            ));
        }
        if hyperparams_init.is_empty() {
            return Err(QHyperError::OptimizerConfig(
                "hyperparams_init must not be empty".into(),
            ));
        }
        validate_bounds(self.bounds)?;

        let points = self.grid_points(hyperparams_init.len())?;
        debug!(points = points.len(), "grid search");
        let pool = build_pool(self.processes)?;

        let values = pool.install(|| {
            points
                .par_iter()
                .map(|h| objective.evaluate(h))
                .collect::<Result<Vec<f64>>>()
        })?;

        let search = HyperparameterSearch::from_evaluations(points.into_iter().zip(values).collect())?;
        log_search(&search, self.name());
        Ok(search)
    }
}
