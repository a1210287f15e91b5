//! # Graph Snapshot
//!
//! The immutable result of an illumination: an ordered vertex map and an
//! adjacency map of aggregated weights. Reducers consume and produce this
//! type; it never references the live stores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point-in-time subgraph.
///
/// Every head in `edges` is also a key of `vertices`. `insert_edge` keeps
/// that invariant by creating missing endpoints with the default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Ord + Deserialize<'de>, V: Deserialize<'de>"
))]
pub struct Graph<K, V> {
    pub vertices: BTreeMap<K, V>,
    pub edges: BTreeMap<K, BTreeMap<K, f64>>,
}

impl<K: Ord + Clone, V: Clone + Default> Graph<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    pub fn insert_vertex(&mut self, key: K, value: V) {
        self.vertices.insert(key, value);
    }

    /// Insert or overwrite the edge `tail → head`.
    pub fn insert_edge(&mut self, tail: K, head: K, weight: f64) {
        self.vertices.entry(tail.clone()).or_default();
        self.vertices.entry(head.clone()).or_default();
        self.edges.entry(tail).or_default().insert(head, weight);
    }

    #[must_use]
    pub fn contains_vertex(&self, key: &K) -> bool {
        self.vertices.contains_key(key)
    }

    #[must_use]
    pub fn weight(&self, tail: &K, head: &K) -> Option<f64> {
        self.edges.get(tail).and_then(|heads| heads.get(head)).copied()
    }

    /// All edges as `(tail, head, weight)` in key order.
    pub fn edges(&self) -> impl Iterator<Item = (&K, &K, f64)> + '_ {
        self.edges
            .iter()
            .flat_map(|(tail, heads)| heads.iter().map(move |(head, w)| (tail, head, *w)))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn out_degree(&self, key: &K) -> usize {
        self.edges.get(key).map_or(0, BTreeMap::len)
    }

    /// Same vertices, no edges. Starting point for the reducers.
    #[must_use]
    pub fn without_edges(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            edges: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone + Default> Default for Graph<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
