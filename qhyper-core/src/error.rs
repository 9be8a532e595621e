//! Error types for QHyper
//!
//! Covers:
//! - Malformed solver results (bitstrings, probabilities)
//! - Problem and optimizer configuration
//! - Cost polynomial construction and sampling
//! - Hyperparameter search

use thiserror::Error;

/// Result type alias for QHyper operations
pub type Result<T> = std::result::Result<T, QHyperError>;

/// Error type for every fallible QHyper operation
#[derive(Error, Debug)]
pub enum QHyperError {
    // ==========================================================================
    // Solver Result Errors
    // ==========================================================================
    /// Bitstring contains characters other than '0' and '1'
    #[error("Invalid bitstring '{0}': only '0' and '1' are allowed")]
    InvalidBitstring(String),

    /// Bitstrings of different lengths mixed in one result set
    #[error("Bitstring length mismatch: expected {expected}, got {got}")]
    BitstringLength { expected: usize, got: usize },

    /// Probability is negative or not a number
    #[error("Invalid probability {probability} for '{bitstring}'")]
    InvalidProbability { bitstring: String, probability: f64 },

    /// Nothing to evaluate
    #[error("Solver results are empty")]
    EmptyResults,

    /// Normalisation requested over zero probability mass
    #[error("Cannot normalize: kept results carry zero probability mass")]
    ZeroProbabilityMass,

    /// Probability vector length is not 2^n
    #[error("Probability vector of length {len} does not match {n_wires} wires")]
    WireCountMismatch { len: usize, n_wires: usize },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Problem could not be built from its configuration
    #[error("Problem configuration error: {0}")]
    ProblemConfig(String),

    /// Optimizer configuration is unusable
    #[error("Optimizer configuration error: {0}")]
    OptimizerConfig(String),

    /// Wrong number of penalty weights for a problem
    #[error("Expected {expected} weights (objective + constraints), got {got}")]
    WeightCountMismatch { expected: usize, got: usize },

    // ==========================================================================
    // Sampling Errors
    // ==========================================================================
    /// Exhaustive enumeration would be too large
    #[error("Cannot enumerate {n_vars} variables (limit {limit})")]
    TooManyVariables { n_vars: usize, limit: usize },

    /// Source parameters are missing or out of range
    #[error("Invalid sampler parameters: {0}")]
    InvalidParameters(String),

    // ==========================================================================
    // Search Errors
    // ==========================================================================
    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Every evaluated candidate returned NaN
    #[error("Search produced no comparable objective value")]
    NoComparableResult,

    // ==========================================================================
    // Other Errors
    // ==========================================================================
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl QHyperError {
    /// Whether the error stems from user-provided configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            QHyperError::ProblemConfig(_)
                | QHyperError::OptimizerConfig(_)
                | QHyperError::WeightCountMismatch { .. }
                | QHyperError::InvalidParameters(_)
        )
    }
}
