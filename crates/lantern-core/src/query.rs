//! # Query Module
//!
//! Structured illumination queries.
//!
//! - A seed vertex, a hop bound and a per-vertex fan-out bound
//! - Optional TF-IDF reweighting
//! - Optional reduction of the result to a tree rooted at the seed

use crate::primitives::{MAX_ILLUMINATE_K, MAX_ILLUMINATE_STEP};
use crate::CacheError;
use serde::{Deserialize, Serialize};

/// Post-processing applied to an illuminated subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimization {
    /// Return the expanded subgraph as is.
    #[default]
    None,
    /// Minimum-weight spanning tree of the seed's component.
    MinimumSpanningTree,
    /// Maximum-weight spanning tree of the seed's component.
    MaximumSpanningTree,
    /// Shortest-path tree from the seed, edge cost = weight.
    ShortestPathTree,
    /// Shortest-path tree from the seed, edge cost = 1 / weight.
    InverseWeightedPathTree,
}

/// Bounded neighborhood expansion from `seed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlluminateQuery<K> {
    pub seed: K,
    /// Maximum hop count from the seed.
    pub step: usize,
    /// Maximum out-edges followed per visited vertex.
    pub k: usize,
    pub tfidf: bool,
    pub optimization: Optimization,
}

impl<K> IlluminateQuery<K> {
    /// Plain expansion, no reweighting, no reduction.
    #[must_use]
    pub fn new(seed: K, step: usize, k: usize) -> Self {
        Self {
            seed,
            step,
            k,
            tfidf: false,
            optimization: Optimization::None,
        }
    }

    #[must_use]
    pub fn with_tfidf(mut self, tfidf: bool) -> Self {
        self.tfidf = tfidf;
        self
    }

    #[must_use]
    pub fn with_optimization(mut self, optimization: Optimization) -> Self {
        self.optimization = optimization;
        self
    }

    /// Reject bounds above the engine limits.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.step > MAX_ILLUMINATE_STEP {
            return Err(CacheError::InvalidQuery(format!(
                "step {} exceeds maximum {}",
                self.step, MAX_ILLUMINATE_STEP
            )));
        }
        if self.k > MAX_ILLUMINATE_K {
            return Err(CacheError::InvalidQuery(format!(
                "k {} exceeds maximum {}",
                self.k, MAX_ILLUMINATE_K
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults() {
        let q = IlluminateQuery::new("a", 2, 3);
        assert!(!q.tfidf);
        assert_eq!(q.optimization, Optimization::None);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn query_builders() {
        let q = IlluminateQuery::new("a", 1, 1)
            .with_tfidf(true)
            .with_optimization(Optimization::MaximumSpanningTree);
        assert!(q.tfidf);
        assert_eq!(q.optimization, Optimization::MaximumSpanningTree);
    }

    #[test]
    fn oversized_bounds_rejected() {
        let q = IlluminateQuery::new("a", MAX_ILLUMINATE_STEP + 1, 1);
        assert!(matches!(q.validate(), Err(CacheError::InvalidQuery(_))));

        let q = IlluminateQuery::new("a", 1, MAX_ILLUMINATE_K + 1);
        assert!(matches!(q.validate(), Err(CacheError::InvalidQuery(_))));
    }

    #[test]
    fn optimization_wire_names() {
        let parsed: Optimization =
            serde_json::from_str("\"inverse_weighted_path_tree\"").expect("parse");
        assert_eq!(parsed, Optimization::InverseWeightedPathTree);
    }
}
