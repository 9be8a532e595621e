//! MaxCut Problem
//!
//! Given a weighted graph G=(V,E), find a partition of the vertices into
//! two sets that maximises the total weight of edges between the sets.
//!
//! # Encoding
//!
//! `x_v = 1` puts vertex `v` in set S. An edge (u, v) is cut exactly when
//! `x_u + x_v - 2 x_u x_v = 1`, so the minimisation objective is
//!
//! ```text
//! C(x) = -Σ_{(u,v)∈E} w_uv (x_u + x_v - 2 x_u x_v)
//! ```
//!
//! There are no constraints.

use crate::error::{QHyperError, Result};
use crate::evaluation::bitstring_to_bits;
use crate::polynomial::Polynomial;
use crate::problems::Problem;

// =============================================================================
// Graph Representation
// =============================================================================

/// Edge in a graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// First vertex
    pub u: usize,
    /// Second vertex
    pub v: usize,
    /// Edge weight (default 1.0)
    pub weight: f64,
}

impl Edge {
    /// Create unweighted edge
    pub fn new(u: usize, v: usize) -> Self {
        Self { u, v, weight: 1.0 }
    }

    /// Create weighted edge
    pub fn weighted(u: usize, v: usize, weight: f64) -> Self {
        Self { u, v, weight }
    }
}

/// Undirected graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    n_vertices: usize,
    edges: Vec<Edge>,
}

impl Graph {
    /// Create empty graph with n vertices
    pub fn new(n_vertices: usize) -> Self {
        Self {
            n_vertices,
            edges: Vec::new(),
        }
    }

    /// Create graph from edge list
    pub fn from_edges(n_vertices: usize, edges: Vec<Edge>) -> Self {
        Self { n_vertices, edges }
    }

    /// Build from `[u, v]` / `[u, v, weight]` rows.
    /// The vertex count defaults to one past the largest endpoint.
    pub fn from_config(n_vertices: Option<usize>, rows: &[Vec<f64>]) -> Result<Self> {
        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let (u, v, weight) = match row.as_slice() {
                [u, v] => (*u, *v, 1.0),
                [u, v, w] => (*u, *v, *w),
                _ => {
                    return Err(QHyperError::ProblemConfig(format!(
                        "edge {:?} must be [u, v] or [u, v, weight]",
                        row
                    )))
                }
            };
            let u = vertex_index(u)?;
            let v = vertex_index(v)?;
            if u == v {
                return Err(QHyperError::ProblemConfig(format!("self-loop on vertex {}", u)));
            }
            edges.push(Edge::weighted(u, v, weight));
        }

        let needed = edges.iter().map(|e| e.u.max(e.v) + 1).max().unwrap_or(0);
        let n_vertices = n_vertices.unwrap_or(needed);
        if n_vertices < needed || n_vertices == 0 {
            return Err(QHyperError::ProblemConfig(format!(
                "graph with {} vertices cannot hold its edges (need {})",
                n_vertices, needed
            )));
        }

        Ok(Self::from_edges(n_vertices, edges))
    }

    /// Add a weighted edge
    pub fn add_weighted_edge(&mut self, u: usize, v: usize, weight: f64) {
        self.edges.push(Edge::weighted(u, v, weight));
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Total weight of all edges
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Triangle graph (3 vertices, 3 edges)
    pub fn triangle() -> Self {
        Self::from_edges(3, vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)])
    }

    /// Complete graph K_n
    pub fn complete(n: usize) -> Self {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push(Edge::new(i, j));
            }
        }
        Self::from_edges(n, edges)
    }

    /// Cycle graph C_n (n vertices, n edges)
    pub fn cycle(n: usize) -> Self {
        let edges = (0..n).map(|i| Edge::new(i, (i + 1) % n)).collect();
        Self::from_edges(n, edges)
    }
}

fn vertex_index(value: f64) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
        return Err(QHyperError::ProblemConfig(format!(
            "vertex {} is not a non-negative integer",
            value
        )));
    }
    Ok(value as usize)
}

// =============================================================================
// MaxCut Problem
// =============================================================================

/// MaxCut problem instance
#[derive(Debug, Clone)]
pub struct MaxCutProblem {
    graph: Graph,
}

impl MaxCutProblem {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Weight of the edges cut by a 0/1 assignment
    pub fn cut_value(&self, bits: &[u8]) -> f64 {
        self.graph
            .edges()
            .iter()
            .filter(|e| bits.get(e.u) != bits.get(e.v))
            .map(|e| e.weight)
            .sum()
    }

    /// Maximum cut by brute force (small graphs only)
    pub fn optimal_cut_value(&self) -> Option<f64> {
        let n = self.graph.n_vertices();
        if n > 24 {
            return None;
        }

        let mut bits = vec![0u8; n];
        let mut best = 0.0f64;
        for assignment in 0..(1usize << n) {
            for (i, b) in bits.iter_mut().enumerate() {
                *b = ((assignment >> i) & 1) as u8;
            }
            best = best.max(self.cut_value(&bits));
        }
        Some(best)
    }
}

impl Problem for MaxCutProblem {
    fn name(&self) -> &str {
        "maxcut"
    }

    fn num_variables(&self) -> usize {
        self.graph.n_vertices()
    }

    fn objective(&self) -> Polynomial {
        let mut cost = Polynomial::new();
        for edge in self.graph.edges() {
            cost.add_term(&[edge.u], -edge.weight);
            cost.add_term(&[edge.v], -edge.weight);
            cost.add_term(&[edge.u, edge.v], 2.0 * edge.weight);
        }
        cost
    }

    fn constraints(&self) -> Vec<Polynomial> {
        Vec::new()
    }

    fn get_score(&self, bitstring: &str, penalty: f64) -> f64 {
        match bitstring_to_bits(bitstring) {
            Ok(bits) if bits.len() == self.num_variables() => -self.cut_value(&bits),
            _ => penalty,
        }
    }
}
