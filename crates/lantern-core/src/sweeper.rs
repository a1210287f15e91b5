//! # Eviction Sweeper
//!
//! A periodic tokio task that reclaims expired vertices and contributions.
//! Reads never depend on it: expired entries already read as absent. The
//! sweeper only bounds memory.
//!
//! The task is either idle (waiting for the next tick) or sweeping. A sweep
//! snapshots the key set, then locks one bucket at a time and yields to the
//! runtime every `SWEEP_BATCH_SIZE` buckets so readers are never starved.
//!
//! Cancellation is observed between ticks: a sweep in progress completes,
//! then the task exits and hands back its accumulated totals.

use crate::cache::GraphCache;
use crate::primitives::SWEEP_BATCH_SIZE;
use crate::storage::PruneOutcome;
use crate::types::{CacheKey, CacheValue};
use crate::CacheError;
use std::ops::AddAssign;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Counts of what one or more sweeps removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub vertices: usize,
    pub contributions: usize,
    pub edge_pairs: usize,
    /// Contributions dropped for carrying a non-finite weight.
    pub anomalies: usize,
    /// Completed sweep passes.
    pub ticks: usize,
}

impl SweepStats {
    pub(crate) fn absorb(&mut self, outcome: PruneOutcome) {
        self.contributions += outcome.contributions;
        self.edge_pairs += outcome.pairs;
        self.anomalies += outcome.anomalies;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices == 0 && self.contributions == 0 && self.edge_pairs == 0
    }
}

impl AddAssign for SweepStats {
    fn add_assign(&mut self, rhs: Self) {
        self.vertices += rhs.vertices;
        self.contributions += rhs.contributions;
        self.edge_pairs += rhs.edge_pairs;
        self.anomalies += rhs.anomalies;
        self.ticks += rhs.ticks;
    }
}

/// Owner's side of a running sweeper.
///
/// Dropping the handle also stops the sweeper, but only
/// [`SweeperHandle::shutdown`] lets the owner wait for it to finish.
#[derive(Debug)]
pub struct SweeperHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<SweepStats>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop after its current tick.
    pub fn cancel(&self) {
        // Err only means the task already exited
        let _ = self.cancel.send(true);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the task to terminate. Returns the totals of every
    /// sweep it ran.
    pub async fn shutdown(self) -> Result<SweepStats, CacheError> {
        self.cancel();
        self.task
            .await
            .map_err(|e| CacheError::IoError(format!("Sweeper task failed: {}", e)))
    }
}

pub(crate) fn spawn<K: CacheKey, V: CacheValue>(
    cache: GraphCache<K, V>,
    interval: Duration,
) -> SweeperHandle {
    let (cancel, cancelled) = watch::channel(false);
    let task = tokio::spawn(run(cache, interval, cancelled));
    SweeperHandle { cancel, task }
}

async fn run<K: CacheKey, V: CacheValue>(
    cache: GraphCache<K, V>,
    interval: Duration,
    mut cancelled: watch::Receiver<bool>,
) -> SweepStats {
    let period = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the first sweep waits a full period.
    ticker.tick().await;

    tracing::info!(interval_ms = period.as_millis() as u64, "Eviction sweeper started");

    let mut totals = SweepStats::default();
    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let stats = sweep_in_batches(&cache).await;
                if !stats.is_empty() {
                    tracing::debug!(
                        vertices = stats.vertices,
                        contributions = stats.contributions,
                        edge_pairs = stats.edge_pairs,
                        "Sweep evicted expired entries"
                    );
                }
                totals += stats;
            }
        }
    }

    tracing::info!(
        ticks = totals.ticks,
        vertices = totals.vertices,
        contributions = totals.contributions,
        "Eviction sweeper stopped"
    );
    totals
}

/// One sweep pass that yields between batches of buckets.
async fn sweep_in_batches<K: CacheKey, V: CacheValue>(cache: &GraphCache<K, V>) -> SweepStats {
    let now = cache.now();
    let mut stats = SweepStats {
        ticks: 1,
        ..SweepStats::default()
    };

    for batch in cache.vertex_keys().chunks(SWEEP_BATCH_SIZE) {
        for key in batch {
            cache.sweep_vertex(key, now, &mut stats);
        }
        tokio::task::yield_now().await;
    }

    for batch in cache.edge_tails().chunks(SWEEP_BATCH_SIZE) {
        for tail in batch {
            cache.sweep_bucket(tail, now, &mut stats);
        }
        tokio::task::yield_now().await;
    }

    stats
}
