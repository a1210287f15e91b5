//! # TF-IDF Reweighting
//!
//! Each tail vertex is a "document" and its live out-edges are its "terms".
//! A traversed edge keeps its live weight as term frequency and is scaled by
//! the smoothed inverse document frequency of its head:
//!
//! ```text
//! idf(head) = ln((1 + N) / (1 + df(head))) + 1
//! w' = w * idf   if w >= 0
//! w' = w / idf   if w <  0
//! ```
//!
//! `N` counts tails with a live edge anywhere in the store, `df(head)` the
//! tails with a live edge to `head`. Since `idf >= 1`, `w'` is increasing in
//! `w` and non-increasing in `df` for any sign of `w`: heads shared by many
//! tails are always pulled down.

use crate::graph::Graph;
use crate::storage::CorpusStatistics;

/// Smoothed inverse document frequency.
#[must_use]
pub fn inverse_document_frequency(documents: usize, frequency: usize) -> f64 {
    let documents = documents.max(frequency) as f64;
    ((1.0 + documents) / (1.0 + frequency as f64)).ln() + 1.0
}

/// Scale one weight by `idf`. Negative weights are divided so a rarer head
/// still ranks higher.
#[must_use]
pub fn scale(weight: f64, idf: f64) -> f64 {
    if weight < 0.0 { weight / idf } else { weight * idf }
}

/// Rescale every edge weight of `graph` in place. Vertex and edge sets are
/// left untouched.
pub fn reweight<K: Ord, V>(graph: &mut Graph<K, V>, stats: &CorpusStatistics<K>) {
    for heads in graph.edges.values_mut() {
        for (head, weight) in heads.iter_mut() {
            let frequency = stats.frequency.get(head).copied().unwrap_or(0);
            *weight = scale(*weight, inverse_document_frequency(stats.documents, frequency));
        }
    }
}
