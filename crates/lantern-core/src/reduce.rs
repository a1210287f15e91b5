//! # Graph Reducers
//!
//! Pure functions that collapse a snapshot to a tree rooted at the seed.
//! Reducers never drop a vertex: anything the tree cannot reach stays in the
//! vertex set without incident edges.
//!
//! - Spanning trees (Prim) treat edges as undirected for connectivity but
//!   keep each chosen edge's original orientation and weight.
//! - Path trees (Dijkstra) follow edge direction and cost each edge through
//!   a caller-supplied transform.

use crate::graph::Graph;
use crate::CacheError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

// =============================================================================
// SPANNING TREES
// =============================================================================

/// Heap entry for Prim's algorithm. Highest `priority` pops first; ties pop
/// the smaller `(tail, head)` first so output is deterministic.
struct Candidate<K> {
    priority: f64,
    weight: f64,
    tail: K,
    head: K,
}

impl<K: Ord> PartialEq for Candidate<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Candidate<K> {}

impl<K: Ord> PartialOrd for Candidate<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Candidate<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.tail.cmp(&self.tail))
            .then_with(|| other.head.cmp(&self.head))
    }
}

/// Edges touching each vertex, in either direction, as `(tail, head, weight)`.
fn incidence<K: Ord + Clone, V>(graph: &Graph<K, V>) -> BTreeMap<K, Vec<(K, K, f64)>> {
    let mut incident: BTreeMap<K, Vec<(K, K, f64)>> = BTreeMap::new();
    for (tail, heads) in &graph.edges {
        for (head, weight) in heads {
            if tail == head {
                continue;
            }
            let edge = (tail.clone(), head.clone(), *weight);
            incident.entry(tail.clone()).or_default().push(edge.clone());
            incident.entry(head.clone()).or_default().push(edge);
        }
    }
    incident
}

fn spanning_tree<K: Ord + Clone, V: Clone + Default>(
    graph: &Graph<K, V>,
    root: &K,
    maximize: bool,
) -> Graph<K, V> {
    let mut tree = graph.without_edges();
    if !graph.contains_vertex(root) {
        return tree;
    }

    let incident = incidence(graph);
    let mut in_tree = BTreeSet::new();
    let mut heap = BinaryHeap::new();

    let push_frontier = |vertex: &K, heap: &mut BinaryHeap<Candidate<K>>| {
        for (tail, head, weight) in incident.get(vertex).into_iter().flatten() {
            heap.push(Candidate {
                priority: if maximize { *weight } else { -*weight },
                weight: *weight,
                tail: tail.clone(),
                head: head.clone(),
            });
        }
    };

    in_tree.insert(root.clone());
    push_frontier(root, &mut heap);

    while let Some(candidate) = heap.pop() {
        let joining = if !in_tree.contains(&candidate.head) {
            candidate.head.clone()
        } else if !in_tree.contains(&candidate.tail) {
            candidate.tail.clone()
        } else {
            continue;
        };

        in_tree.insert(joining.clone());
        tree.insert_edge(candidate.tail, candidate.head, candidate.weight);
        push_frontier(&joining, &mut heap);
    }

    tree
}

/// Minimum-total-weight spanning tree of the component containing `root`.
#[must_use]
pub fn minimum_spanning_tree<K: Ord + Clone, V: Clone + Default>(
    graph: &Graph<K, V>,
    root: &K,
) -> Graph<K, V> {
    spanning_tree(graph, root, false)
}

/// Maximum-total-weight spanning tree of the component containing `root`.
#[must_use]
pub fn maximum_spanning_tree<K: Ord + Clone, V: Clone + Default>(
    graph: &Graph<K, V>,
    root: &K,
) -> Graph<K, V> {
    spanning_tree(graph, root, true)
}

// =============================================================================
// PATH TREES
// =============================================================================

/// Edge cost for true shortest paths.
#[must_use]
pub fn identity(weight: f64) -> f64 {
    weight
}

/// Edge cost for paths that maximize multiplicative affinity: heavier edges
/// are cheaper. A zero weight costs `+inf` and is never followed.
#[must_use]
pub fn reciprocal(weight: f64) -> f64 {
    1.0 / weight
}

/// Dijkstra frontier entry; the cheapest `cost` pops first.
struct Frontier<K> {
    cost: f64,
    vertex: K,
}

impl<K: Ord> PartialEq for Frontier<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Frontier<K> {}

impl<K: Ord> PartialOrd for Frontier<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Frontier<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Single-source path tree from `root`.
///
/// Every edge weight is mapped through `transform` before relaxation. A
/// negative or NaN cost fails with `InvalidTransform`; `+inf` marks an edge
/// as unusable. Tree edges carry the snapshot weight, not the cost.
pub fn path_tree<K, V, F>(
    graph: &Graph<K, V>,
    root: &K,
    transform: F,
) -> Result<Graph<K, V>, CacheError>
where
    K: Ord + Clone,
    V: Clone + Default,
    F: Fn(f64) -> f64,
{
    let mut costs: BTreeMap<&K, Vec<(&K, f64)>> = BTreeMap::new();
    for (tail, head, weight) in graph.edges() {
        let cost = transform(weight);
        if cost.is_nan() || cost < 0.0 {
            return Err(CacheError::InvalidTransform {
                weight,
                transformed: cost,
            });
        }
        if cost.is_finite() {
            costs.entry(tail).or_default().push((head, cost));
        }
    }

    let mut tree = graph.without_edges();
    if !graph.contains_vertex(root) {
        return Ok(tree);
    }

    let mut dist: BTreeMap<&K, f64> = BTreeMap::new();
    let mut parent: BTreeMap<&K, &K> = BTreeMap::new();
    let mut settled: BTreeSet<&K> = BTreeSet::new();
    let mut heap = BinaryHeap::new();

    dist.insert(root, 0.0);
    heap.push(Frontier {
        cost: 0.0,
        vertex: root,
    });

    while let Some(Frontier { cost, vertex }) = heap.pop() {
        if !settled.insert(vertex) {
            continue;
        }
        for &(head, edge_cost) in costs.get(vertex).into_iter().flatten() {
            if settled.contains(head) {
                continue;
            }
            let candidate = cost + edge_cost;
            let improves = dist.get(head).is_none_or(|known| candidate < *known);
            if improves {
                dist.insert(head, candidate);
                parent.insert(head, vertex);
                heap.push(Frontier {
                    cost: candidate,
                    vertex: head,
                });
            }
        }
    }

    for (child, tail) in parent {
        if let Some(weight) = graph.weight(tail, child) {
            tree.insert_edge(tail.clone(), child.clone(), weight);
        }
    }

    Ok(tree)
}

// =============================================================================
// TESTS
// =============================================================================
