//! Run files read by the CLI

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use qhyper_core::{
    problem_from_config, EvaluationConfig, HyperOptimizerConfig, Problem, ProblemConfig,
    SolverResults,
};
use serde::Deserialize;

fn default_temperature() -> f64 {
    1.0
}

/// Tuning run description
///
/// ```json
/// {
///   "problem": {"type": "knapsack", "items": [[1, 2], [1, 1]], "max_weight": 2},
///   "evaluation": {"penalty": 0, "limit_results": 10},
///   "tuner": {"type": "random", "number_of_samples": 50, "seed": 1},
///   "hyperparams_init": [1, 1, 1],
///   "temperature": 0.5
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Problem description, validated by [`ProblemConfig::from_json`]
    pub problem: serde_json::Value,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub tuner: HyperOptimizerConfig,
    /// Starting weights; empty means one per objective and constraint
    #[serde(default)]
    pub hyperparams_init: Vec<f64>,
    /// Gibbs temperature used for every candidate
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Override of the sampler's variable limit
    #[serde(default)]
    pub max_variables: Option<usize>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read run file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid run file {}", path.display()))
    }

    pub fn build_problem(&self) -> Result<Box<dyn Problem>> {
        let config = ProblemConfig::from_json(&self.problem)?;
        Ok(problem_from_config(&config)?)
    }
}

/// Read a problem description file
pub fn load_problem(path: &Path) -> Result<Box<dyn Problem>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read problem file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let config = ProblemConfig::from_json(&value)
        .with_context(|| format!("invalid problem in {}", path.display()))?;
    Ok(problem_from_config(&config)?)
}

/// Read a `{"bitstring": probability, ...}` file, keeping the file order
pub fn load_results(path: &Path) -> Result<SolverResults> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read results file {}", path.display()))?;
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("results file {} is not a JSON object", path.display()))?;

    let mut results = SolverResults::new();
    for (bitstring, value) in map {
        let probability = value
            .as_f64()
            .with_context(|| format!("probability of {} is not a number", bitstring))?;
        results
            .insert(bitstring, probability)
            .with_context(|| format!("invalid entry in {}", path.display()))?;
    }
    Ok(results)
}
