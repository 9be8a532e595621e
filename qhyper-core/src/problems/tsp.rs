//! Travelling Salesman Problem
//!
//! Variables `x[t·n + c]` mark city `c` as the `t`-th stop of a closed
//! tour over `n` cities. Distances are normalised by the largest entry
//! so objective weights stay comparable across instances.
//!
//! ```text
//! objective   = Σ_t Σ_{a,b} d_ab · x[t,a] · x[t+1,b]       (t+1 mod n)
//! constraint1 = Σ_t (1 - Σ_c x[t,c])²                      one city per stop
//! constraint2 = Σ_c (1 - Σ_t x[t,c])²                      one stop per city
//! ```

use ndarray::Array2;

use crate::error::{QHyperError, Result};
use crate::polynomial::Polynomial;
use crate::problems::{bit, Problem};

/// TSP instance
#[derive(Debug, Clone)]
pub struct TspProblem {
    /// Normalised distance matrix
    distances: Array2<f64>,
}

impl TspProblem {
    /// Create from a square, non-negative distance matrix
    pub fn new(distances: Array2<f64>) -> Result<Self> {
        let (rows, cols) = distances.dim();
        if rows == 0 || rows != cols {
            return Err(QHyperError::ProblemConfig(format!(
                "distance matrix must be square and non-empty, got {}x{}",
                rows, cols
            )));
        }
        if distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(QHyperError::ProblemConfig(
                "distances must be finite and non-negative".into(),
            ));
        }

        let max = distances.iter().copied().fold(0.0f64, f64::max);
        let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
        Ok(Self {
            distances: distances.mapv(|d| d * scale),
        })
    }

    /// Create from matrix rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if rows.iter().any(|r| r.len() != n) {
            return Err(QHyperError::ProblemConfig(
                "distance matrix rows must all have one entry per city".into(),
            ));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((n, n), flat)
            .map_err(|e| QHyperError::ProblemConfig(e.to_string()))?;
        Self::new(matrix)
    }

    /// Number of cities
    pub fn n_cities(&self) -> usize {
        self.distances.nrows()
    }

    /// Normalised distance matrix
    pub fn distances(&self) -> &Array2<f64> {
        &self.distances
    }

    fn var(&self, stop: usize, city: usize) -> usize {
        stop * self.n_cities() + city
    }

    /// City visited at each stop, if the assignment is a permutation
    pub fn decode_tour(&self, bitstring: &str) -> Option<Vec<usize>> {
        let n = self.n_cities();
        let bits = bitstring.as_bytes();
        if bits.len() != n * n {
            return None;
        }

        let mut tour = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        for stop in 0..n {
            let mut chosen = (0..n).filter(|&c| bit(bits, self.var(stop, c)));
            let city = chosen.next()?;
            if chosen.next().is_some() || visited[city] {
                return None;
            }
            visited[city] = true;
            tour.push(city);
        }
        Some(tour)
    }

    /// Normalised length of a closed tour
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        let n = tour.len();
        (0..n)
            .map(|i| self.distances[[tour[i], tour[(i + n - 1) % n]]])
            .sum()
    }
}

impl Problem for TspProblem {
    fn name(&self) -> &str {
        "tsp"
    }

    fn num_variables(&self) -> usize {
        self.n_cities() * self.n_cities()
    }

    fn objective(&self) -> Polynomial {
        let n = self.n_cities();
        let mut cost = Polynomial::new();
        for stop in 0..n {
            let next = (stop + 1) % n;
            if next == stop {
                continue;
            }
            for a in 0..n {
                for b in 0..n {
                    let d = self.distances[[a, b]];
                    if a != b && d != 0.0 {
                        cost.add_term(&[self.var(stop, a), self.var(next, b)], d);
                    }
                }
            }
        }
        cost
    }

    fn constraints(&self) -> Vec<Polynomial> {
        let n = self.n_cities();
        let one = Polynomial::constant(1.0);

        let mut per_stop = Polynomial::new();
        for stop in 0..n {
            let row: Vec<(usize, f64)> = (0..n).map(|c| (self.var(stop, c), 1.0)).collect();
            per_stop += &(&one - &Polynomial::linear(&row)).square();
        }

        let mut per_city = Polynomial::new();
        for city in 0..n {
            let col: Vec<(usize, f64)> = (0..n).map(|t| (self.var(t, city), 1.0)).collect();
            per_city += &(&one - &Polynomial::linear(&col)).square();
        }

        vec![per_stop, per_city]
    }

    fn get_score(&self, bitstring: &str, penalty: f64) -> f64 {
        match self.decode_tour(bitstring) {
            Some(tour) => self.tour_length(&tour),
            None => penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn three_cities() -> TspProblem {
        TspProblem::new(array![[0.0, 1.0, 2.0], [1.0, 0.0, 4.0], [2.0, 4.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_normalisation() {
        let problem = three_cities();
        assert_eq!(problem.distances()[[1, 2]], 1.0);
        assert_eq!(problem.distances()[[0, 1]], 0.25);
        assert_eq!(problem.num_variables(), 9);
    }

    #[test]
    fn test_invalid_matrices() {
        assert!(TspProblem::from_rows(&[vec![0.0, 1.0]]).is_err());
        assert!(TspProblem::from_rows(&[]).is_err());
        assert!(TspProblem::from_rows(&[vec![0.0, -1.0], vec![1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_decode_and_score() {
        let problem = three_cities();
        // stops: 0 -> city 0, 1 -> city 1, 2 -> city 2
        assert_eq!(problem.decode_tour("100010001"), Some(vec![0, 1, 2]));
        // 0.25 + 1.0 + 0.5
        assert!((problem.get_score("100010001", -1.0) - 1.75).abs() < 1e-12);

        // city 0 twice
        assert_eq!(problem.get_score("100100001", -1.0), -1.0);
        // empty stop
        assert_eq!(problem.get_score("000010001", -1.0), -1.0);
        // two cities at one stop
        assert_eq!(problem.get_score("110010001", -1.0), -1.0);
    }

    #[test]
    fn test_constraints_zero_on_permutations() {
        let problem = three_cities();
        let constraints = problem.constraints();
        let perm = [0, 1, 0, 0, 0, 1, 1, 0, 0];
        for c in &constraints {
            assert!(c.evaluate(&perm).abs() < 1e-10);
        }
        let broken = [1, 1, 0, 0, 0, 1, 0, 0, 0];
        assert!(constraints.iter().map(|c| c.evaluate(&broken)).sum::<f64>() > 0.5);
    }

    #[test]
    fn test_objective_matches_tour_length() {
        let problem = three_cities();
        let objective = problem.objective();
        let bits = [0, 1, 0, 0, 0, 1, 1, 0, 0];
        let expected = problem.tour_length(&[1, 2, 0]);
        assert!((objective.evaluate(&bits) - expected).abs() < 1e-10);
    }
}
