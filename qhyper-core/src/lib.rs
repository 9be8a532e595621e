//! QHyper Core
//!
//! Building blocks for tuning penalty weights and solver parameters of
//! QUBO formulations: combinatorial problems, their cost polynomials,
//! a classical probability source, the weighted-average evaluator and
//! parallel hyperparameter search.

pub mod converter; // Objective + weighted constraint penalties
pub mod error;
pub mod evaluation; // Weighted-average scoring of solver distributions
pub mod objective;
pub mod optimizers; // Inner optimizers and hyperparameter search
pub mod polynomial; // Binary polynomials (x^2 = x)
pub mod problems;
pub mod sampler; // Exact Boltzmann distribution over bitstrings

pub use converter::Converter;
pub use error::{QHyperError, Result};
pub use evaluation::{
    add_evaluation_to_results, bitstring_to_bits, index_to_bitstring, sort_solver_results,
    weighted_avg_evaluation, EvaluatedResult, EvaluationConfig, SolverResults,
};
pub use objective::ProbabilityObjective;
pub use optimizers::{
    Dummy, GridSearch, HyperObjective, HyperOptimizerConfig, HyperparameterSearch,
    HyperparametersOptimizer, OptimizationResult, Optimizer, RandomSearch, Worker,
};
pub use polynomial::Polynomial;
pub use problems::{
    problem_from_config, Edge, Graph, Item, KnapsackProblem, MaxCutProblem, Problem,
    ProblemConfig, TspProblem, WorkflowSchedulingProblem, PROBLEM_TYPES,
};
pub use sampler::{GibbsSampler, ProbabilitySource, DEFAULT_MAX_VARIABLES};
