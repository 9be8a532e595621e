//! Binary Polynomials
//!
//! Pseudo-boolean polynomials over binary variables `x_i ∈ {0, 1}`.
//! Every monomial is stored as the sorted set of its variable indices,
//! so `x_i² = x_i` is applied on construction and products never raise
//! a variable above degree one.
//!
//! Problem objectives, constraint penalties and the final cost function
//! handed to a solver are all `Polynomial`s.
//!
//! ```ignore
//! let x0 = Polynomial::variable(0);
//! let x1 = Polynomial::variable(1);
//! let penalty = (Polynomial::constant(1.0) - &x0 - &x1).square();
//! assert_eq!(penalty.evaluate(&[1, 0]), 0.0);
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use ndarray::Array2;
use rustc_hash::FxHashMap;

use crate::error::{QHyperError, Result};

/// Coefficients below this magnitude are dropped
const COEFF_EPSILON: f64 = 1e-12;

/// Polynomial over binary variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    /// Monomial (sorted, unique variable indices) -> coefficient
    terms: FxHashMap<Vec<usize>, f64>,
}

impl Polynomial {
    /// Zero polynomial
    pub fn new() -> Self {
        Self::default()
    }

    /// Constant polynomial
    pub fn constant(value: f64) -> Self {
        let mut p = Self::new();
        p.add_term(&[], value);
        p
    }

    /// Single variable `x_i`
    pub fn variable(i: usize) -> Self {
        let mut p = Self::new();
        p.add_term(&[i], 1.0);
        p
    }

    /// Complement `1 - x_i`
    pub fn complement(i: usize) -> Self {
        let mut p = Self::constant(1.0);
        p.add_term(&[i], -1.0);
        p
    }

    /// Linear form `Σ c_i x_i`
    pub fn linear(coefficients: &[(usize, f64)]) -> Self {
        let mut p = Self::new();
        for &(i, c) in coefficients {
            p.add_term(&[i], c);
        }
        p
    }

    /// Add `coeff · Π x_v` over `vars`; repeated variables collapse
    pub fn add_term(&mut self, vars: &[usize], coeff: f64) {
        let mut monomial = vars.to_vec();
        monomial.sort_unstable();
        monomial.dedup();
        self.add_monomial(monomial, coeff);
    }

    fn add_monomial(&mut self, monomial: Vec<usize>, coeff: f64) {
        let entry = self.terms.entry(monomial).or_insert(0.0);
        *entry += coeff;
        if entry.abs() < COEFF_EPSILON {
            self.terms.retain(|_, c| c.abs() >= COEFF_EPSILON);
        }
    }

    /// Coefficient of a monomial
    pub fn coefficient(&self, vars: &[usize]) -> f64 {
        let mut monomial = vars.to_vec();
        monomial.sort_unstable();
        monomial.dedup();
        self.terms.get(&monomial).copied().unwrap_or(0.0)
    }

    /// Constant term
    pub fn constant_term(&self) -> f64 {
        self.coefficient(&[])
    }

    /// Iterate over (monomial, coefficient)
    pub fn terms(&self) -> impl Iterator<Item = (&[usize], f64)> + '_ {
        self.terms.iter().map(|(m, c)| (m.as_slice(), *c))
    }

    /// Number of non-zero terms
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Highest monomial degree
    pub fn degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    /// True for QUBO-shaped polynomials (degree <= 2)
    pub fn is_quadratic(&self) -> bool {
        self.degree() <= 2
    }

    /// One past the highest variable index
    pub fn num_variables(&self) -> usize {
        self.terms
            .keys()
            .filter_map(|m| m.last())
            .max()
            .map_or(0, |&v| v + 1)
    }

    /// Multiply every coefficient by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        let mut p = Self::new();
        if factor.abs() < COEFF_EPSILON {
            return p;
        }
        for (m, c) in &self.terms {
            p.terms.insert(m.clone(), c * factor);
        }
        p
    }

    /// `self · self`
    pub fn square(&self) -> Self {
        self * self
    }

    /// Evaluate on an assignment; `bits[i]` is the value of `x_i`.
    /// Variables beyond `bits` read as zero.
    pub fn evaluate(&self, bits: &[u8]) -> f64 {
        self.terms
            .iter()
            .filter(|(m, _)| m.iter().all(|&v| bits.get(v).copied().unwrap_or(0) != 0))
            .map(|(_, c)| c)
            .sum()
    }

    /// Evaluate on the basis state `index` of an `n_bits` register,
    /// where variable 0 is the most significant bit.
    pub fn evaluate_index(&self, index: usize, n_bits: usize) -> f64 {
        self.terms
            .iter()
            .filter(|(m, _)| {
                m.iter()
                    .all(|&v| v < n_bits && (index >> (n_bits - 1 - v)) & 1 == 1)
            })
            .map(|(_, c)| c)
            .sum()
    }

    /// Upper-triangular QUBO matrix `Q` with `x^T Q x + offset = self(x)`.
    ///
    /// Returns the matrix and the constant offset.
    pub fn to_qubo_matrix(&self, n_vars: usize) -> Result<(Array2<f64>, f64)> {
        if !self.is_quadratic() {
            return Err(QHyperError::InvalidParameters(format!(
                "polynomial of degree {} is not a QUBO",
                self.degree()
            )));
        }
        if self.num_variables() > n_vars {
            return Err(QHyperError::InvalidParameters(format!(
                "polynomial uses {} variables, matrix has {}",
                self.num_variables(),
                n_vars
            )));
        }

        let mut q = Array2::<f64>::zeros((n_vars, n_vars));
        let mut offset = 0.0;
        for (m, &c) in &self.terms {
            match m.as_slice() {
                [] => offset += c,
                [i] => q[[*i, *i]] += c,
                [i, j] => q[[*i, *j]] += c,
                _ => {
                    return Err(QHyperError::InvalidParameters(format!(
                        "monomial {:?} is not quadratic",
                        m
                    )))
                }
            }
        }
        Ok((q, offset))
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }

        let mut terms: Vec<_> = self.terms.iter().collect();
        terms.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));

        for (k, (m, c)) in terms.into_iter().enumerate() {
            if k > 0 {
                write!(f, " {} ", if *c < 0.0 { '-' } else { '+' })?;
            } else if *c < 0.0 {
                write!(f, "-")?;
            }
            write!(f, "{}", c.abs())?;
            for v in m {
                write!(f, "*x{}", v)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        for (m, c) in &rhs.terms {
            self.add_monomial(m.clone(), *c);
        }
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut p = self.clone();
        p += rhs;
        p
    }
}

impl Add<&Polynomial> for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: &Polynomial) -> Polynomial {
        self += rhs;
        self
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: Polynomial) -> Polynomial {
        self += &rhs;
        self
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Sub<&Polynomial> for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut p = Polynomial::new();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                let mut monomial: Vec<usize> = m1.iter().chain(m2.iter()).copied().collect();
                monomial.sort_unstable();
                monomial.dedup();
                p.add_monomial(monomial, c1 * c2);
            }
        }
        p
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Mul<f64> for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: f64) -> Polynomial {
        self.scale(rhs)
    }
}

impl Mul<f64> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: f64) -> Polynomial {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_binary_reduction() {
        let x = Polynomial::variable(3);
        let sq = x.square();
        assert_eq!(sq, x);
        assert_eq!(sq.degree(), 1);
    }

    #[test]
    fn test_one_hot_penalty() {
        // (1 - x0 - x1)^2 = 1 - x0 - x1 + 2 x0 x1 after reduction
        let p = (Polynomial::constant(1.0) - Polynomial::linear(&[(0, 1.0), (1, 1.0)])).square();
        assert!((p.constant_term() - 1.0).abs() < EPSILON);
        assert!((p.coefficient(&[0]) + 1.0).abs() < EPSILON);
        assert!((p.coefficient(&[1, 0]) - 2.0).abs() < EPSILON);

        assert_eq!(p.evaluate(&[0, 0]), 1.0);
        assert_eq!(p.evaluate(&[1, 0]), 0.0);
        assert_eq!(p.evaluate(&[0, 1]), 0.0);
        assert!((p.evaluate(&[1, 1]) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_cancellation_drops_terms() {
        let x = Polynomial::variable(0);
        let zero = &x - &x;
        assert!(zero.is_zero());
        assert_eq!(zero.n_terms(), 0);
        assert_eq!(zero.to_string(), "0");
    }

    #[test]
    fn test_evaluate_index_msb_first() {
        // 2 x0 + 3 x2 on a 3-bit register
        let p = Polynomial::linear(&[(0, 2.0), (2, 3.0)]);
        assert_eq!(p.evaluate_index(0b100, 3), 2.0);
        assert_eq!(p.evaluate_index(0b001, 3), 3.0);
        assert_eq!(p.evaluate_index(0b101, 3), 5.0);
        assert_eq!(p.evaluate_index(0b101, 3), p.evaluate(&[1, 0, 1]));
    }

    #[test]
    fn test_degree_and_variables() {
        let mut p = Polynomial::new();
        p.add_term(&[4, 1, 2], 1.5);
        p.add_term(&[0], -1.0);
        assert_eq!(p.degree(), 3);
        assert!(!p.is_quadratic());
        assert_eq!(p.num_variables(), 5);
        assert!(p.to_qubo_matrix(5).is_err());
    }

    #[test]
    fn test_qubo_matrix() {
        let mut p = Polynomial::constant(2.0);
        p.add_term(&[0], -1.0);
        p.add_term(&[1, 0], 4.0);
        let (q, offset) = p.to_qubo_matrix(2).unwrap();

        assert_eq!(offset, 2.0);
        assert_eq!(q[[0, 0]], -1.0);
        assert_eq!(q[[0, 1]], 4.0);
        assert_eq!(q[[1, 0]], 0.0);
        assert!(p.to_qubo_matrix(1).is_err());
    }

    #[test]
    fn test_display() {
        let mut p = Polynomial::constant(1.0);
        p.add_term(&[0], -2.0);
        p.add_term(&[0, 1], 0.5);
        assert_eq!(p.to_string(), "1 - 2*x0 + 0.5*x0*x1");
    }
}
