//! # lantern-core
//!
//! The Graph Cache Engine for Lantern.
//!
//! An in-memory, concurrently accessible graph where vertices carry typed
//! values and directed edges carry weights. Every vertex and every edge
//! contribution has its own expiration:
//!
//! - A vertex write replaces the previous value and expiration
//! - An edge write *adds* a contribution; the edge weight is the sum of
//!   contributions that are still live, so weights decay piecewise as
//!   contributions expire
//! - Expired entries read as absent immediately; the background sweeper
//!   only reclaims memory
//!
//! ## Illumination
//!
//! [`GraphCache::illuminate`] extracts a bounded neighborhood of a seed
//! vertex (at most `k` strongest out-edges per vertex, at most `step` hops),
//! optionally reweights it with TF-IDF, and optionally reduces it to a
//! spanning tree or a path tree.
//!
//! ## Architectural Constraints
//!
//! - No persistence: state lives and dies with the process
//! - No store-wide exclusive lock: stores are sharded by key
//! - Snapshots are ordered so identical state gives identical output

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod clock;
pub mod graph;
pub mod illuminate;
pub mod primitives;
pub mod query;
pub mod reduce;
pub mod storage;
pub mod sweeper;
pub mod tfidf;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{CacheError, CacheKey, CacheValue, Value};

// =============================================================================
// RE-EXPORTS: Graph Cache
// =============================================================================

pub use cache::{CacheStats, GraphCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use graph::Graph;
pub use query::{IlluminateQuery, Optimization};
pub use sweeper::{SweepStats, SweeperHandle};
