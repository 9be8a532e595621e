//! Knapsack Problem
//!
//! Given items with integer weights and real values, choose a subset
//! whose total weight does not exceed `max_weight` and whose value is
//! maximal.
//!
//! # Encoding
//!
//! ```text
//! x_0 .. x_{n-1}          item i is packed
//! y_1 .. y_W              one-hot total weight (W = max_weight)
//!
//! objective   = -Σ v_i x_i
//! constraint1 = (1 - Σ_w y_w)²
//! constraint2 = (Σ_w w·y_w - Σ_i w_i x_i)²
//! ```
//!
//! The bitstring is `x` followed by `y`.

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;
use crate::problems::{bit, Problem};

/// Knapsack item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub weight: usize,
    pub value: f64,
}

impl Item {
    pub fn new(weight: usize, value: f64) -> Self {
        Self { weight, value }
    }
}

/// Knapsack problem instance
#[derive(Debug, Clone)]
pub struct KnapsackProblem {
    items: Vec<Item>,
    max_weight: usize,
}

impl KnapsackProblem {
    /// Create a knapsack instance
    pub fn new(items: Vec<Item>, max_weight: usize) -> Result<Self> {
        if items.is_empty() {
            return Err(QHyperError::ProblemConfig(
                "knapsack needs at least one item".into(),
            ));
        }
        if max_weight == 0 {
            return Err(QHyperError::ProblemConfig(
                "knapsack max_weight must be positive".into(),
            ));
        }
        if items.iter().any(|item| !item.value.is_finite()) {
            return Err(QHyperError::ProblemConfig(
                "knapsack item values must be finite".into(),
            ));
        }
        Ok(Self { items, max_weight })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    fn slack_index(&self, weight: usize) -> usize {
        self.items.len() + weight - 1
    }

    /// Best achievable value (0/1 knapsack dynamic programme)
    pub fn optimal_value(&self) -> f64 {
        let mut best = vec![0.0f64; self.max_weight + 1];
        for item in &self.items {
            for w in (item.weight..=self.max_weight).rev() {
                best[w] = best[w].max(best[w - item.weight] + item.value);
            }
        }
        best[self.max_weight]
    }
}

impl Problem for KnapsackProblem {
    fn name(&self) -> &str {
        "knapsack"
    }

    fn num_variables(&self) -> usize {
        self.items.len() + self.max_weight
    }

    fn objective(&self) -> Polynomial {
        let coefficients: Vec<(usize, f64)> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (i, -item.value))
            .collect();
        Polynomial::linear(&coefficients)
    }

    fn constraints(&self) -> Vec<Polynomial> {
        let slack: Vec<(usize, f64)> = (1..=self.max_weight)
            .map(|w| (self.slack_index(w), 1.0))
            .collect();
        let one_hot = (Polynomial::constant(1.0) - Polynomial::linear(&slack)).square();

        let declared: Vec<(usize, f64)> = (1..=self.max_weight)
            .map(|w| (self.slack_index(w), w as f64))
            .collect();
        let packed: Vec<(usize, f64)> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (i, item.weight as f64))
            .collect();
        let weight_match = (Polynomial::linear(&declared) - Polynomial::linear(&packed)).square();

        vec![one_hot, weight_match]
    }

    fn get_score(&self, bitstring: &str, penalty: f64) -> f64 {
        let bits = bitstring.as_bytes();
        if bits.len() != self.num_variables() {
            return penalty;
        }

        let (weight, value) = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| bit(bits, *i))
            .fold((0usize, 0.0), |(w, v), (_, item)| {
                (w + item.weight, v + item.value)
            });

        if weight > self.max_weight {
            return penalty;
        }

        let slack_mismatch =
            (1..=self.max_weight).any(|w| bit(bits, self.slack_index(w)) && w != weight);
        if slack_mismatch {
            return penalty;
        }

        -value
    }
}
