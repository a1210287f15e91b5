//! # Graph Cache
//!
//! The façade over the vertex and edge stores. Every operation the service
//! layer needs goes through [`GraphCache`]:
//!
//! - Point operations on vertices and edge pairs
//! - Illumination (expand → optional TF-IDF → optional reduction)
//! - Eviction, either one synchronous pass or the background sweeper
//!
//! `GraphCache` is a cheap handle: clones share the same stores.

use crate::clock::{self, Clock, SystemClock};
use crate::graph::Graph;
use crate::illuminate;
use crate::query::{IlluminateQuery, Optimization};
use crate::reduce;
use crate::storage::{EdgeStore, VertexStore};
use crate::sweeper::{self, SweepStats, SweeperHandle};
use crate::tfidf;
use crate::types::{CacheKey, CacheValue};
use crate::{CacheError, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Store sizes, including entries that have expired but not been swept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub vertices: usize,
    pub edge_pairs: usize,
    pub contributions: usize,
}

/// Concurrent TTL graph cache.
pub struct GraphCache<K, V = Value> {
    vertices: Arc<VertexStore<K, V>>,
    edges: Arc<EdgeStore<K>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<K, V> Clone for GraphCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            vertices: Arc::clone(&self.vertices),
            edges: Arc::clone(&self.edges),
            clock: Arc::clone(&self.clock),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K: CacheKey, V: CacheValue> fmt::Debug for GraphCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphCache")
            .field("stats", &self.stats())
            .field("clock", &self.clock)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl<K: CacheKey, V: CacheValue> GraphCache<K, V> {
    /// Create an empty cache on the wall clock.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            vertices: Arc::new(VertexStore::new()),
            edges: Arc::new(EdgeStore::new()),
            clock,
            default_ttl,
        }
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Absolute expiration `ttl` from now.
    #[must_use]
    pub fn expiration_after(&self, ttl: Duration) -> DateTime<Utc> {
        clock::offset(self.now(), ttl)
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    pub fn put_vertex(&self, key: K, value: V, expiration: DateTime<Utc>) {
        self.vertices.put(key, value, expiration);
    }

    pub fn put_vertex_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.put_vertex(key, value, self.expiration_after(ttl));
    }

    /// Put with the cache's default TTL.
    pub fn put_vertex_default(&self, key: K, value: V) {
        self.put_vertex_with_ttl(key, value, self.default_ttl);
    }

    /// Live value of `key`, or `None` if absent or expired.
    pub fn get_vertex(&self, key: &K) -> Option<V> {
        self.vertices.get(key, self.now())
    }

    /// Live value of `key` together with its expiration.
    pub fn get_vertex_entry(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        self.vertices.get_entry(key, self.now())
    }

    pub fn delete_vertex(&self, key: &K) {
        self.vertices.delete(key);
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Add one contribution to `tail → head`.
    pub fn add_edge(&self, tail: K, head: K, weight: f64, expiration: DateTime<Utc>) {
        self.edges.add(tail, head, weight, expiration);
    }

    pub fn add_edge_with_ttl(&self, tail: K, head: K, weight: f64, ttl: Duration) {
        self.add_edge(tail, head, weight, self.expiration_after(ttl));
    }

    /// Add with the cache's default TTL.
    pub fn add_edge_default(&self, tail: K, head: K, weight: f64) {
        self.add_edge_with_ttl(tail, head, weight, self.default_ttl);
    }

    /// Sum of live contributions.
    ///
    /// `Some(0.0)` for a pair whose contributions have all expired but which
    /// has not been swept yet; `None` once untracked.
    pub fn get_edge_weight(&self, tail: &K, head: &K) -> Option<f64> {
        self.edges.weight(tail, head, self.now())
    }

    /// Drop every contribution of the pair, regardless of remaining TTL.
    pub fn delete_edge(&self, tail: &K, head: &K) {
        self.edges.delete(tail, head);
    }

    /// Live out-neighbors of `tail` with aggregated weights.
    pub fn neighbors(&self, tail: &K) -> Vec<(K, f64)> {
        self.edges.neighbors(tail, self.now())
    }

    // =========================================================================
    // ILLUMINATION
    // =========================================================================

    /// Expand the neighborhood of `query.seed`, then reweight and reduce as
    /// the query asks.
    pub fn illuminate(&self, query: &IlluminateQuery<K>) -> Result<Graph<K, V>, CacheError> {
        let now = self.now();
        let mut graph = illuminate::expand(
            &self.vertices,
            &self.edges,
            &query.seed,
            query.step,
            query.k,
            now,
        );

        if query.tfidf {
            let heads: BTreeSet<K> = graph
                .edges
                .values()
                .flat_map(|heads| heads.keys().cloned())
                .collect();
            let stats = self.edges.corpus_statistics(&heads, now);
            tfidf::reweight(&mut graph, &stats);
        }

        let graph = match query.optimization {
            Optimization::None => graph,
            Optimization::MinimumSpanningTree => reduce::minimum_spanning_tree(&graph, &query.seed),
            Optimization::MaximumSpanningTree => reduce::maximum_spanning_tree(&graph, &query.seed),
            Optimization::ShortestPathTree => {
                reduce::path_tree(&graph, &query.seed, reduce::identity)?
            }
            Optimization::InverseWeightedPathTree => {
                reduce::path_tree(&graph, &query.seed, reduce::reciprocal)?
            }
        };

        tracing::debug!(
            seed = ?query.seed,
            step = query.step,
            k = query.k,
            tfidf = query.tfidf,
            optimization = ?query.optimization,
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "Illuminated"
        );

        Ok(graph)
    }

    // =========================================================================
    // EVICTION
    // =========================================================================

    /// Remove `key` from the vertex store if expired.
    pub(crate) fn sweep_vertex(&self, key: &K, now: DateTime<Utc>, stats: &mut SweepStats) {
        if self.vertices.evict_if_expired(key, now) {
            stats.vertices += 1;
        }
    }

    /// Prune one tail bucket, logging and skipping past any anomaly.
    pub(crate) fn sweep_bucket(&self, tail: &K, now: DateTime<Utc>, stats: &mut SweepStats) {
        let outcome = self.edges.prune(tail, now);
        if outcome.anomalies > 0 {
            tracing::warn!(
                tail = ?tail,
                dropped = outcome.anomalies,
                "Dropped edge contributions with non-finite weight"
            );
        }
        stats.absorb(outcome);
    }

    pub(crate) fn vertex_keys(&self) -> Vec<K> {
        self.vertices.keys()
    }

    pub(crate) fn edge_tails(&self) -> Vec<K> {
        self.edges.tails()
    }

    /// One full eviction pass, synchronously.
    pub fn sweep(&self) -> SweepStats {
        let now = self.now();
        let mut stats = SweepStats::default();
        for key in self.vertex_keys() {
            self.sweep_vertex(&key, now, &mut stats);
        }
        for tail in self.edge_tails() {
            self.sweep_bucket(&tail, now, &mut stats);
        }
        stats
    }

    /// Spawn the background sweeper on the current tokio runtime.
    ///
    /// The sweeper stops when the handle is cancelled or dropped.
    pub fn start_eviction_sweeper(&self, interval: Duration) -> SweeperHandle {
        sweeper::spawn(self.clone(), interval)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            vertices: self.vertices.len(),
            edge_pairs: self.edges.pair_count(),
            contributions: self.edges.contribution_count(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
