//! # Edge Store
//!
//! Edges are kept as tail buckets: `tail → (head → [contribution])`.
//!
//! A contribution is one `add` call. It is never merged or mutated; the
//! observable weight of a pair is the sum of the contributions that have not
//! expired yet, computed on every read. Writes lock only the shard holding the
//! tail bucket.

use crate::types::CacheKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};

/// One independently expiring weight addition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub weight: f64,
    pub expiration: DateTime<Utc>,
}

impl Contribution {
    #[must_use]
    pub const fn new(weight: f64, expiration: DateTime<Utc>) -> Self {
        Self { weight, expiration }
    }

    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }
}

fn live_sum(contributions: &[Contribution], now: DateTime<Utc>) -> f64 {
    contributions
        .iter()
        .filter(|c| c.is_live(now))
        .map(|c| c.weight)
        .sum()
}

fn any_live(contributions: &[Contribution], now: DateTime<Utc>) -> bool {
    contributions.iter().any(|c| c.is_live(now))
}

type Bucket<K> = BTreeMap<K, Vec<Contribution>>;

/// What one bucket prune removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub contributions: usize,
    pub pairs: usize,
    /// Contributions dropped because their weight was not finite.
    pub anomalies: usize,
}

/// Corpus-wide counts used by TF-IDF reweighting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStatistics<K> {
    /// Distinct tails with at least one live out-edge.
    pub documents: usize,
    /// For each requested head, distinct tails with a live edge to it.
    pub frequency: BTreeMap<K, usize>,
}

/// Concurrent edge storage with contribution-level expiration.
pub struct EdgeStore<K> {
    adjacency: DashMap<K, Bucket<K>>,
}

impl<K: CacheKey> EdgeStore<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adjacency: DashMap::new(),
        }
    }

    /// Append a contribution. Existing contributions are left untouched.
    pub fn add(&self, tail: K, head: K, weight: f64, expiration: DateTime<Utc>) {
        self.adjacency
            .entry(tail)
            .or_default()
            .entry(head)
            .or_default()
            .push(Contribution::new(weight, expiration));
    }

    /// Sum of the live contributions for the pair.
    ///
    /// A pair stays tracked until it is deleted or the sweeper drops its last
    /// contribution, so a fully expired but unswept pair yields `Some(0.0)`.
    pub fn weight(&self, tail: &K, head: &K, now: DateTime<Utc>) -> Option<f64> {
        let bucket = self.adjacency.get(tail)?;
        bucket.get(head).map(|contributions| live_sum(contributions, now))
    }

    /// Drop every contribution for the pair. Returns whether it was tracked.
    pub fn delete(&self, tail: &K, head: &K) -> bool {
        let removed = match self.adjacency.get_mut(tail) {
            Some(mut bucket) => bucket.remove(head).is_some(),
            None => return false,
        };
        self.adjacency.remove_if(tail, |_, bucket| bucket.is_empty());
        removed
    }

    /// Heads with at least one live contribution from `tail`, with their
    /// aggregated weight, in key order.
    pub fn neighbors(&self, tail: &K, now: DateTime<Utc>) -> Vec<(K, f64)> {
        let Some(bucket) = self.adjacency.get(tail) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter(|(_, contributions)| any_live(contributions, now))
            .map(|(head, contributions)| (head.clone(), live_sum(contributions, now)))
            .collect()
    }

    /// One pass over every bucket, counting documents and the frequency of
    /// each head in `heads`.
    pub fn corpus_statistics(&self, heads: &BTreeSet<K>, now: DateTime<Utc>) -> CorpusStatistics<K> {
        let mut stats = CorpusStatistics {
            documents: 0,
            frequency: heads.iter().map(|h| (h.clone(), 0)).collect(),
        };

        for bucket in self.adjacency.iter() {
            let mut is_document = false;
            for (head, contributions) in bucket.value() {
                if !any_live(contributions, now) {
                    continue;
                }
                is_document = true;
                if let Some(count) = stats.frequency.get_mut(head) {
                    *count = count.saturating_add(1);
                }
            }
            if is_document {
                stats.documents = stats.documents.saturating_add(1);
            }
        }

        stats
    }

    /// Snapshot of the tails that currently own a bucket.
    pub fn tails(&self) -> Vec<K> {
        self.adjacency
            .iter()
            .map(|bucket| bucket.key().clone())
            .collect()
    }

    /// Remove expired and non-finite contributions from one tail bucket,
    /// dropping pairs and the bucket itself once empty.
    pub fn prune(&self, tail: &K, now: DateTime<Utc>) -> PruneOutcome {
        let mut outcome = PruneOutcome::default();

        {
            let Some(mut bucket) = self.adjacency.get_mut(tail) else {
                return outcome;
            };
            bucket.retain(|_, contributions| {
                let before = contributions.len();
                contributions.retain(|c| {
                    if !c.weight.is_finite() {
                        outcome.anomalies += 1;
                        return false;
                    }
                    c.is_live(now)
                });
                outcome.contributions += before - contributions.len();
                if contributions.is_empty() {
                    outcome.pairs += 1;
                    false
                } else {
                    true
                }
            });
        }

        self.adjacency.remove_if(tail, |_, bucket| bucket.is_empty());
        outcome
    }

    /// Number of tracked (tail, head) pairs.
    pub fn pair_count(&self) -> usize {
        self.adjacency.iter().map(|bucket| bucket.len()).sum()
    }

    /// Number of stored contributions, live or not.
    pub fn contribution_count(&self) -> usize {
        self.adjacency
            .iter()
            .map(|bucket| bucket.values().map(Vec::len).sum::<usize>())
            .sum()
    }
}

impl<K: CacheKey> Default for EdgeStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn contributions_are_additive() {
        let store = EdgeStore::new();
        let now = Utc::now();
        for _ in 0..3 {
            store.add(key("a"), key("b"), 1.5, now + TimeDelta::seconds(10));
        }

        assert_eq!(store.weight(&key("a"), &key("b"), now), Some(4.5));
        assert_eq!(store.contribution_count(), 3);
        assert_eq!(store.pair_count(), 1);
    }

    #[test]
    fn untracked_pair_has_no_weight() {
        let store: EdgeStore<String> = EdgeStore::new();
        assert_eq!(store.weight(&key("a"), &key("b"), Utc::now()), None);
    }

    #[test]
    fn expired_pair_reads_zero_until_pruned() {
        let store = EdgeStore::new();
        let now = Utc::now();
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(1));
        let later = now + TimeDelta::seconds(2);

        assert_eq!(store.weight(&key("a"), &key("b"), later), Some(0.0));

        let outcome = store.prune(&key("a"), later);
        assert_eq!(outcome.contributions, 1);
        assert_eq!(outcome.pairs, 1);
        assert_eq!(store.weight(&key("a"), &key("b"), later), None);
        assert!(store.tails().is_empty());
    }

    #[test]
    fn prune_keeps_live_contributions() {
        let store = EdgeStore::new();
        let now = Utc::now();
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(1));
        store.add(key("a"), key("b"), 2.0, now + TimeDelta::seconds(5));

        let outcome = store.prune(&key("a"), now + TimeDelta::seconds(2));
        assert_eq!(outcome.contributions, 1);
        assert_eq!(outcome.pairs, 0);
        assert_eq!(store.weight(&key("a"), &key("b"), now), Some(2.0));
    }

    #[test]
    fn prune_drops_non_finite_weights() {
        let store = EdgeStore::new();
        let now = Utc::now();
        store.add(key("a"), key("b"), f64::NAN, now + TimeDelta::seconds(5));
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(5));

        let outcome = store.prune(&key("a"), now);
        assert_eq!(outcome.anomalies, 1);
        assert_eq!(store.weight(&key("a"), &key("b"), now), Some(1.0));
    }

    #[test]
    fn delete_clears_every_contribution() {
        let store = EdgeStore::new();
        let now = Utc::now();
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(60));
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(60));
        store.add(key("a"), key("c"), 1.0, now + TimeDelta::seconds(60));

        assert!(store.delete(&key("a"), &key("b")));
        assert!(!store.delete(&key("a"), &key("b")));
        assert_eq!(store.weight(&key("a"), &key("b"), now), None);
        assert_eq!(store.weight(&key("a"), &key("c"), now), Some(1.0));
    }

    #[test]
    fn neighbors_skip_dead_pairs() {
        let store = EdgeStore::new();
        let now = Utc::now();
        store.add(key("a"), key("c"), 2.0, now + TimeDelta::seconds(60));
        store.add(key("a"), key("b"), 1.0, now + TimeDelta::seconds(60));
        store.add(key("a"), key("d"), 1.0, now - TimeDelta::seconds(1));

        let neighbors = store.neighbors(&key("a"), now);
        assert_eq!(neighbors, vec![(key("b"), 1.0), (key("c"), 2.0)]);
    }

    #[test]
    fn corpus_counts_distinct_tails() {
        let store = EdgeStore::new();
        let now = Utc::now();
        let ttl = now + TimeDelta::seconds(60);
        store.add(key("a"), key("hub"), 1.0, ttl);
        store.add(key("a"), key("hub"), 1.0, ttl);
        store.add(key("b"), key("hub"), 1.0, ttl);
        store.add(key("c"), key("rare"), 1.0, ttl);
        store.add(key("d"), key("hub"), 1.0, now - TimeDelta::seconds(1));

        let heads: BTreeSet<String> = [key("hub"), key("rare")].into_iter().collect();
        let stats = store.corpus_statistics(&heads, now);

        assert_eq!(stats.documents, 3);
        assert_eq!(stats.frequency.get("hub"), Some(&2));
        assert_eq!(stats.frequency.get("rare"), Some(&1));
    }
}
