//! Solver Result Evaluation
//!
//! Turns a probability distribution over bitstrings, as returned by any
//! solver backend, into a single scalar objective value and a ranked result
//! set.
//!
//! # Weighted average
//!
//! For the `k` most probable bitstrings `x_1..x_k` with probabilities
//! `p_1..p_k` and a score function `s`:
//!
//! ```text
//! E = scaler · Σ_i p_i · s(x_i, penalty)
//! scaler = 1 / Σ_i p_i   (normalize = true)
//!        = 1             (normalize = false)
//! ```
//!
//! Bitstring character `i` (from the left) is variable `i` of the problem.
//!
//! # Example
//!
//! ```ignore
//! use qhyper_core::evaluation::{weighted_avg_evaluation, EvaluationConfig, SolverResults};
//!
//! let results = SolverResults::from_probabilities(&probs, 5)?;
//! let config = EvaluationConfig::default().with_penalty(-1.0).with_limit(10);
//! let value = weighted_avg_evaluation(&results, |x, p| problem.get_score(x, p), &config)?;
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{QHyperError, Result};

// =============================================================================
// Solver Results
// =============================================================================

/// Probability distribution over bitstrings, in insertion order
#[derive(Debug, Clone, Default)]
pub struct SolverResults {
    /// (bitstring, probability) pairs
    entries: Vec<(String, f64)>,
    /// Position of every bitstring in `entries`
    index: FxHashMap<String, usize>,
}

impl SolverResults {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (bitstring, probability) pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut results = Self::new();
        for (bitstring, probability) in pairs {
            results.insert(bitstring, probability)?;
        }
        Ok(results)
    }

    /// Build from a full probability vector over `n_wires` qubits.
    ///
    /// Entry `i` maps to `i` written in binary, zero-padded to `n_wires`
    /// characters with the most significant bit first.
    pub fn from_probabilities(probs: &[f64], n_wires: usize) -> Result<Self> {
        if n_wires == 0 || n_wires >= usize::BITS as usize || probs.len() != 1usize << n_wires {
            return Err(QHyperError::WireCountMismatch {
                len: probs.len(),
                n_wires,
            });
        }

        let mut results = Self::new();
        results.entries.reserve(probs.len());
        for (i, &p) in probs.iter().enumerate() {
            results.insert(index_to_bitstring(i, n_wires), p)?;
        }
        Ok(results)
    }

    /// Build from measurement shot counts
    pub fn from_counts<I, S>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let counts: Vec<(String, u64)> = counts.into_iter().map(|(b, c)| (b.into(), c)).collect();
        let total: u64 = counts.iter().map(|(_, c)| c).sum();
        if total == 0 {
            return Err(QHyperError::ZeroProbabilityMass);
        }

        Self::from_pairs(
            counts
                .into_iter()
                .map(|(b, c)| (b, c as f64 / total as f64)),
        )
    }

    /// Insert a bitstring. An existing bitstring keeps its position and
    /// takes the new probability.
    pub fn insert(&mut self, bitstring: impl Into<String>, probability: f64) -> Result<()> {
        let bitstring = bitstring.into();
        validate_bitstring(&bitstring)?;

        if let Some(expected) = self.n_bits() {
            if bitstring.len() != expected {
                return Err(QHyperError::BitstringLength {
                    expected,
                    got: bitstring.len(),
                });
            }
        }

        if !probability.is_finite() || probability < 0.0 {
            return Err(QHyperError::InvalidProbability {
                bitstring,
                probability,
            });
        }

        match self.index.get(&bitstring) {
            Some(&pos) => self.entries[pos].1 = probability,
            None => {
                self.index.insert(bitstring.clone(), self.entries.len());
                self.entries.push((bitstring, probability));
            }
        }
        Ok(())
    }

    /// Number of bitstrings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no bitstring is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the stored bitstrings
    pub fn n_bits(&self) -> Option<usize> {
        self.entries.first().map(|(b, _)| b.len())
    }

    /// Probability of a bitstring
    pub fn get(&self, bitstring: &str) -> Option<f64> {
        self.index.get(bitstring).map(|&pos| self.entries[pos].1)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(b, p)| (b.as_str(), *p))
    }

    /// Bitstrings in insertion order
    pub fn bitstrings(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(b, _)| b.as_str())
    }

    /// Sum of all probabilities
    pub fn total_probability(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Most probable bitstring (earliest wins on ties)
    pub fn most_probable(&self) -> Option<(&str, f64)> {
        self.iter()
            .fold(None, |best: Option<(&str, f64)>, (b, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((b, p)),
            })
    }
}

/// Convert a basis state index to its bitstring (MSB first)
pub fn index_to_bitstring(index: usize, n_bits: usize) -> String {
    (0..n_bits)
        .rev()
        .map(|bit| if (index >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

/// Decode a bitstring into 0/1 values
pub fn bitstring_to_bits(bitstring: &str) -> Result<Vec<u8>> {
    validate_bitstring(bitstring)?;
    Ok(bitstring.bytes().map(|c| c - b'0').collect())
}

fn validate_bitstring(bitstring: &str) -> Result<()> {
    if bitstring.is_empty() || !bitstring.bytes().all(|c| c == b'0' || c == b'1') {
        return Err(QHyperError::InvalidBitstring(bitstring.to_string()));
    }
    Ok(())
}

// =============================================================================
// Evaluation Configuration
// =============================================================================

/// Parameters of the weighted average evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Score given to solutions that violate the constraints
    pub penalty: f64,
    /// Only the most probable results are considered (None = all)
    pub limit_results: Option<usize>,
    /// Rescale kept probabilities to sum to one
    pub normalize: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            penalty: 0.0,
            limit_results: None,
            normalize: true,
        }
    }
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set penalty
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Builder: consider only the `limit` most probable results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_results = Some(limit);
        self
    }

    /// Builder: enable or disable normalisation
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

// =============================================================================
// Ranking and Evaluation
// =============================================================================

/// Bitstring with its probability and score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedResult {
    pub bitstring: String,
    pub probability: f64,
    pub score: f64,
}

/// Sort results by probability, highest first, keeping at most
/// `limit_results` entries. `None` and `Some(0)` keep everything.
/// Equal probabilities keep their input order.
pub fn sort_solver_results(results: &SolverResults, limit_results: Option<usize>) -> SolverResults {
    let limit = match limit_results {
        Some(limit) if limit > 0 => limit.min(results.len()),
        _ => results.len(),
    };

    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| results.entries[b].1.total_cmp(&results.entries[a].1));

    let mut sorted = SolverResults::new();
    sorted.entries.reserve(limit);
    for &pos in order.iter().take(limit) {
        let (bitstring, probability) = &results.entries[pos];
        sorted.index.insert(bitstring.clone(), sorted.entries.len());
        sorted.entries.push((bitstring.clone(), *probability));
    }
    sorted
}

/// Probability-weighted average of the scores of the most probable results
pub fn weighted_avg_evaluation<F>(
    results: &SolverResults,
    score_function: F,
    config: &EvaluationConfig,
) -> Result<f64>
where
    F: Fn(&str, f64) -> f64,
{
    if results.is_empty() {
        return Err(QHyperError::EmptyResults);
    }

    let sorted = sort_solver_results(results, config.limit_results);

    let scaler = if config.normalize {
        let mass = sorted.total_probability();
        if mass <= 0.0 {
            return Err(QHyperError::ZeroProbabilityMass);
        }
        1.0 / mass
    } else {
        1.0
    };

    Ok(sorted
        .iter()
        .map(|(bitstring, p)| scaler * p * score_function(bitstring, config.penalty))
        .sum())
}

/// Attach the score of every bitstring, preserving order
pub fn add_evaluation_to_results<F>(
    results: &SolverResults,
    score_function: F,
    penalty: f64,
) -> Vec<EvaluatedResult>
where
    F: Fn(&str, f64) -> f64,
{
    results
        .iter()
        .map(|(bitstring, probability)| EvaluatedResult {
            bitstring: bitstring.to_string(),
            probability,
            score: score_function(bitstring, penalty),
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn ones(x: &str, _penalty: f64) -> f64 {
        x.matches('1').count() as f64
    }

    #[test]
    fn test_index_to_bitstring() {
        assert_eq!(index_to_bitstring(0, 3), "000");
        assert_eq!(index_to_bitstring(1, 3), "001");
        assert_eq!(index_to_bitstring(6, 3), "110");
        assert_eq!(index_to_bitstring(5, 5), "00101");
    }

    #[test]
    fn test_bitstring_to_bits() {
        assert_eq!(bitstring_to_bits("0110").unwrap(), vec![0, 1, 1, 0]);
        assert!(matches!(
            bitstring_to_bits("01 1"),
            Err(QHyperError::InvalidBitstring(_))
        ));
        assert!(bitstring_to_bits("").is_err());
    }

    #[test]
    fn test_from_probabilities() {
        let results = SolverResults::from_probabilities(&[0.1, 0.2, 0.3, 0.4], 2).unwrap();
        let pairs: Vec<_> = results.iter().collect();
        assert_eq!(pairs, vec![("00", 0.1), ("01", 0.2), ("10", 0.3), ("11", 0.4)]);
        assert_eq!(results.n_bits(), Some(2));

        assert!(matches!(
            SolverResults::from_probabilities(&[0.5, 0.5, 0.0], 2),
            Err(QHyperError::WireCountMismatch { len: 3, n_wires: 2 })
        ));
        assert!(matches!(
            SolverResults::from_probabilities(&[1.0], 0),
            Err(QHyperError::WireCountMismatch { len: 1, n_wires: 0 })
        ));
    }

    #[test]
    fn test_from_counts() {
        let results = SolverResults::from_counts(vec![("01", 3u64), ("10", 1)]).unwrap();
        assert!((results.get("01").unwrap() - 0.75).abs() < EPSILON);
        assert!((results.get("10").unwrap() - 0.25).abs() < EPSILON);

        assert!(SolverResults::from_counts(vec![("01", 0u64)]).is_err());
    }

    #[test]
    fn test_insert_validation() {
        let mut results = SolverResults::new();
        assert!(results.insert("012", 0.1).is_err());
        assert!(results.insert("", 0.1).is_err());
        assert!(results.insert("01", -0.1).is_err());
        assert!(results.insert("01", f64::NAN).is_err());

        results.insert("01", 0.1).unwrap();
        assert!(matches!(
            results.insert("011", 0.1),
            Err(QHyperError::BitstringLength { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_insert_duplicate_keeps_position() {
        let mut results = SolverResults::new();
        results.insert("00", 0.1).unwrap();
        results.insert("11", 0.2).unwrap();
        results.insert("00", 0.7).unwrap();

        let pairs: Vec<_> = results.iter().collect();
        assert_eq!(pairs, vec![("00", 0.7), ("11", 0.2)]);
    }

    #[test]
    fn test_sort_stable_on_ties() {
        let results =
            SolverResults::from_pairs(vec![("00", 0.25), ("01", 0.5), ("10", 0.25), ("11", 0.0)])
                .unwrap();

        let sorted = sort_solver_results(&results, None);
        let order: Vec<_> = sorted.bitstrings().collect();
        assert_eq!(order, vec!["01", "00", "10", "11"]);

        let top = sort_solver_results(&results, Some(2));
        let order: Vec<_> = top.bitstrings().collect();
        assert_eq!(order, vec!["01", "00"]);
    }

    #[test]
    fn test_sort_zero_limit_keeps_all() {
        let results = SolverResults::from_probabilities(&[0.1, 0.2, 0.3, 0.4], 2).unwrap();
        assert_eq!(sort_solver_results(&results, Some(0)).len(), 4);
        assert_eq!(sort_solver_results(&results, Some(100)).len(), 4);
    }

    #[test]
    fn test_weighted_avg_normalized() {
        let results = SolverResults::from_pairs(vec![("11", 0.2), ("01", 0.2)]).unwrap();
        let value = weighted_avg_evaluation(&results, ones, &EvaluationConfig::default()).unwrap();
        // (0.2 * 2 + 0.2 * 1) / 0.4
        assert!((value - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_weighted_avg_unnormalized() {
        let results = SolverResults::from_pairs(vec![("11", 0.2), ("01", 0.2)]).unwrap();
        let config = EvaluationConfig::default().with_normalize(false);
        let value = weighted_avg_evaluation(&results, ones, &config).unwrap();
        assert!((value - 0.6).abs() < EPSILON);
    }

    #[test]
    fn test_weighted_avg_uses_penalty() {
        let results = SolverResults::from_pairs(vec![("1", 1.0)]).unwrap();
        let config = EvaluationConfig::default().with_penalty(-7.0);
        let value = weighted_avg_evaluation(&results, |_, p| p, &config).unwrap();
        assert_eq!(value, -7.0);
    }

    #[test]
    fn test_weighted_avg_errors() {
        let empty = SolverResults::new();
        assert!(matches!(
            weighted_avg_evaluation(&empty, ones, &EvaluationConfig::default()),
            Err(QHyperError::EmptyResults)
        ));

        let zero = SolverResults::from_pairs(vec![("0", 0.0), ("1", 0.0)]).unwrap();
        assert!(matches!(
            weighted_avg_evaluation(&zero, ones, &EvaluationConfig::default()),
            Err(QHyperError::ZeroProbabilityMass)
        ));

        let config = EvaluationConfig::default().with_normalize(false);
        assert_eq!(weighted_avg_evaluation(&zero, ones, &config).unwrap(), 0.0);
    }

    #[test]
    fn test_add_evaluation() {
        let results = SolverResults::from_pairs(vec![("10", 0.6), ("11", 0.4)]).unwrap();
        let evaluated = add_evaluation_to_results(&results, ones, 0.0);

        assert_eq!(evaluated.len(), 2);
        assert_eq!(evaluated[0].bitstring, "10");
        assert_eq!(evaluated[0].score, 1.0);
        assert_eq!(evaluated[1].probability, 0.4);
        assert_eq!(evaluated[1].score, 2.0);
    }

    #[test]
    fn test_most_probable() {
        let results =
            SolverResults::from_pairs(vec![("00", 0.4), ("01", 0.4), ("10", 0.2)]).unwrap();
        assert_eq!(results.most_probable(), Some(("00", 0.4)));
        assert_eq!(SolverResults::new().most_probable(), None);
    }

    #[test]
    fn test_evaluation_config_json() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{"penalty": -1.0, "limit_results": 10}"#).unwrap();
        assert_eq!(config, EvaluationConfig::default().with_penalty(-1.0).with_limit(10));
    }
}
