//! Evaluate-only optimizer

use crate::error::Result;
use crate::optimizers::{OptimizationResult, Optimizer};

/// Returns `func(init)` without searching. Used when the inner arguments
/// are fixed and only hyperparameters are tuned.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dummy;

impl Optimizer for Dummy {
    fn minimize(
        &self,
        func: &dyn Fn(&[f64]) -> Result<f64>,
        init: &[f64],
    ) -> Result<OptimizationResult> {
        let value = func(init)?;
        Ok(OptimizationResult::new(value, init.to_vec()).with_history(vec![value]))
    }
}
