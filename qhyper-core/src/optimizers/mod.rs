//! Optimizers
//!
//! Two layers of optimisation are involved when tuning a solver:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ HyperparametersOptimizer (RandomSearch, GridSearch)          │
//! │   for each hyperparameter vector h (in parallel):            │
//! │     ┌──────────────────────────────────────────────────────┐ │
//! │     │ Worker                                               │ │
//! │     │   func = func_creator(h)                             │ │
//! │     │   Optimizer::minimize(func, init).value              │ │
//! │     └──────────────────────────────────────────────────────┘ │
//! │   return h with the lowest value                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inner optimizers (`Optimizer`) are external collaborators; this crate
//! ships only [`Dummy`], which evaluates the initial arguments once.

pub mod dummy;
pub mod grid;
pub mod random;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QHyperError, Result};

pub use dummy::Dummy;
pub use grid::GridSearch;
pub use random::RandomSearch;

// =============================================================================
// Inner Optimizer
// =============================================================================

/// Result of an inner optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best objective value found
    pub value: f64,
    /// Arguments that produced `value`
    pub params: Vec<f64>,
    /// Objective value per iteration
    pub history: Vec<f64>,
}

impl OptimizationResult {
    pub fn new(value: f64, params: Vec<f64>) -> Self {
        Self {
            value,
            params,
            history: Vec::new(),
        }
    }

    /// Builder: attach history
    pub fn with_history(mut self, history: Vec<f64>) -> Self {
        self.history = history;
        self
    }
}

/// Minimises a scalar function of a parameter vector
pub trait Optimizer: Send + Sync {
    fn minimize(
        &self,
        func: &dyn Fn(&[f64]) -> Result<f64>,
        init: &[f64],
    ) -> Result<OptimizationResult>;
}

// =============================================================================
// Hyperparameter Search
// =============================================================================

/// Scalar function of a hyperparameter vector
pub trait HyperObjective: Sync {
    fn evaluate(&self, hyperparams: &[f64]) -> Result<f64>;
}

/// Runs an inner optimizer on the function built for each hyperparameter
/// vector and reports the optimizer's best value
pub struct Worker<'a, C> {
    func_creator: C,
    optimizer: &'a dyn Optimizer,
    init: Vec<f64>,
}

impl<'a, C, F> Worker<'a, C>
where
    C: Fn(&[f64]) -> F + Sync,
    F: Fn(&[f64]) -> Result<f64>,
{
    pub fn new(func_creator: C, optimizer: &'a dyn Optimizer, init: Vec<f64>) -> Self {
        Self {
            func_creator,
            optimizer,
            init,
        }
    }

    /// Full inner optimisation result for one hyperparameter vector
    pub fn run(&self, hyperparams: &[f64]) -> Result<OptimizationResult> {
        let func = (self.func_creator)(hyperparams);
        self.optimizer.minimize(&func, &self.init)
    }
}

impl<'a, C, F> HyperObjective for Worker<'a, C>
where
    C: Fn(&[f64]) -> F + Sync,
    F: Fn(&[f64]) -> Result<f64>,
{
    fn evaluate(&self, hyperparams: &[f64]) -> Result<f64> {
        Ok(self.run(hyperparams)?.value)
    }
}

/// Outcome of a hyperparameter search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HyperparameterSearch {
    /// Hyperparameters with the lowest value
    pub best_params: Vec<f64>,
    /// Lowest value
    pub best_value: f64,
    /// Every evaluated (hyperparameters, value) pair, in sampling order
    pub evaluations: Vec<(Vec<f64>, f64)>,
}

impl HyperparameterSearch {
    /// Pick the lowest value; NaN never wins and ties go to the
    /// earliest candidate
    pub fn from_evaluations(evaluations: Vec<(Vec<f64>, f64)>) -> Result<Self> {
        let best = evaluations
            .iter()
            .enumerate()
            .filter(|(_, (_, v))| !v.is_nan())
            .fold(None, |best: Option<(usize, f64)>, (i, (_, v))| match best {
                Some((_, bv)) if bv <= *v => best,
                _ => Some((i, *v)),
            });

        let (idx, best_value) = best.ok_or(QHyperError::NoComparableResult)?;
        Ok(Self {
            best_params: evaluations[idx].0.clone(),
            best_value,
            evaluations,
        })
    }
}

/// Searches hyperparameters of a nested optimisation
pub trait HyperparametersOptimizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Return the hyperparameters that lead to the lowest objective.
    /// `hyperparams_init` fixes the dimension of the search space.
    fn minimize(
        &self,
        objective: &dyn HyperObjective,
        hyperparams_init: &[f64],
    ) -> Result<HyperparameterSearch>;
}

pub(crate) fn validate_bounds(bounds: (f64, f64)) -> Result<()> {
    let (lo, hi) = bounds;
    if !lo.is_finite() || !hi.is_finite() || lo > hi || !(hi - lo).is_finite() {
        return Err(QHyperError::OptimizerConfig(format!(
            "bounds [{}, {}] must be finite with lower <= upper and a finite span",
            lo, hi
        )));
    }
    Ok(())
}

pub(crate) fn build_pool(processes: usize) -> Result<rayon::ThreadPool> {
    if processes == 0 {
        return Err(QHyperError::OptimizerConfig(
            "processes must be at least 1".into(),
        ));
    }
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(processes)
        .build()?)
}

pub(crate) fn log_search(search: &HyperparameterSearch, optimizer: &str) {
    info!(
        optimizer,
        evaluated = search.evaluations.len(),
        best_value = search.best_value,
        best_params = ?search.best_params,
        "hyperparameter search finished"
    );
}

// =============================================================================
// Configuration
// =============================================================================

fn default_samples() -> usize {
    random::DEFAULT_SAMPLES
}

fn default_points() -> usize {
    grid::DEFAULT_POINTS_PER_DIM
}

fn default_bounds() -> (f64, f64) {
    random::DEFAULT_BOUNDS
}

/// Hyperparameter optimizer description, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HyperOptimizerConfig {
    Random {
        #[serde(default = "default_samples")]
        number_of_samples: usize,
        #[serde(default)]
        processes: Option<usize>,
        #[serde(default = "default_bounds")]
        bounds: (f64, f64),
        #[serde(default)]
        seed: Option<u64>,
    },
    Grid {
        #[serde(default = "default_points")]
        points_per_dim: usize,
        #[serde(default)]
        processes: Option<usize>,
        #[serde(default = "default_bounds")]
        bounds: (f64, f64),
    },
}

impl Default for HyperOptimizerConfig {
    fn default() -> Self {
        HyperOptimizerConfig::Random {
            number_of_samples: default_samples(),
            processes: None,
            bounds: default_bounds(),
            seed: None,
        }
    }
}

impl HyperOptimizerConfig {
    /// Instantiate the configured optimizer
    pub fn build(&self) -> Box<dyn HyperparametersOptimizer> {
        match self {
            HyperOptimizerConfig::Random {
                number_of_samples,
                processes,
                bounds,
                seed,
            } => {
                let mut search = RandomSearch::new(*number_of_samples).with_bounds(bounds.0, bounds.1);
                if let Some(p) = processes {
                    search = search.with_processes(*p);
                }
                if let Some(s) = seed {
                    search = search.with_seed(*s);
                }
                Box::new(search)
            }
            HyperOptimizerConfig::Grid {
                points_per_dim,
                processes,
                bounds,
            } => {
                let mut search = GridSearch::new(*points_per_dim).with_bounds(bounds.0, bounds.1);
                if let Some(p) = processes {
                    search = search.with_processes(*p);
                }
                Box::new(search)
            }
        }
    }
}
