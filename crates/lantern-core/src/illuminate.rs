//! # Neighborhood Expansion
//!
//! Bounded breadth-first walk from a seed vertex. At every visited vertex
//! only the `k` heaviest live out-edges are followed, and nothing beyond
//! `step` hops is enqueued. First-seen distance wins; this is a fan-out walk,
//! not a shortest-path search.

use crate::graph::Graph;
use crate::primitives::{MAX_ILLUMINATE_K, MAX_ILLUMINATE_STEP};
use crate::storage::{EdgeStore, VertexStore};
use crate::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, VecDeque};

/// Heaviest first; equal weights fall back to key order.
fn top_k<K: Ord>(mut neighbors: Vec<(K, f64)>, k: usize) -> Vec<(K, f64)> {
    neighbors.sort_by(|(ka, wa), (kb, wb)| wb.total_cmp(wa).then_with(|| ka.cmp(kb)));
    neighbors.truncate(k);
    neighbors
}

/// Expand `seed` against the live stores as of `now`.
///
/// The result holds every visited vertex (stored value, or the default when
/// the vertex has none) and every edge actually followed, with its live
/// aggregated weight.
pub fn expand<K: CacheKey, V: CacheValue>(
    vertices: &VertexStore<K, V>,
    edges: &EdgeStore<K>,
    seed: &K,
    step: usize,
    k: usize,
    now: DateTime<Utc>,
) -> Graph<K, V> {
    let step = step.min(MAX_ILLUMINATE_STEP);
    let k = k.min(MAX_ILLUMINATE_K);

    let mut graph = Graph::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();

    seen.insert(seed.clone());
    queue.push_back((seed.clone(), 0usize));

    while let Some((current, distance)) = queue.pop_front() {
        if distance >= step || k == 0 {
            continue;
        }

        for (head, weight) in top_k(edges.neighbors(&current, now), k) {
            if seen.insert(head.clone()) {
                queue.push_back((head.clone(), distance.saturating_add(1)));
            }
            graph.insert_edge(current.clone(), head, weight);
        }
    }

    for key in seen {
        let value = vertices.get(&key, now).unwrap_or_default();
        graph.insert_vertex(key, value);
    }

    graph
}

// =============================================================================
// TESTS
// =============================================================================
