//! # Storage Module
//!
//! The two concurrent stores owned by the graph cache.
//!
//! - `VertexStore`: key → (value, expiration)
//! - `EdgeStore`: tail → head → independently expiring contributions

pub mod edge;
pub mod vertex;

pub use edge::{Contribution, CorpusStatistics, EdgeStore, PruneOutcome};
pub use vertex::VertexStore;
