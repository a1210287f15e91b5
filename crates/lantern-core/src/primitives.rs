//! # Runtime Constants
//!
//! Fixed defaults and bounds for the Lantern graph cache.
//!
//! All queries must be computationally bounded; these limits are enforced at
//! the service boundary and clamped again inside the engine.

use std::time::Duration;

/// Default lifetime of a vertex or edge contribution when the caller gives
/// no explicit expiration.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default period of the eviction sweeper.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Number of buckets the sweeper prunes before yielding to the runtime.
///
/// Keeps a full sweep from monopolizing a worker thread while readers wait.
pub const SWEEP_BATCH_SIZE: usize = 256;

/// Maximum hop count for an illumination.
pub const MAX_ILLUMINATE_STEP: usize = 100;

/// Maximum per-vertex fan-out for an illumination.
pub const MAX_ILLUMINATE_K: usize = 1000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for vertex keys, in bytes.
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum number of vertices or edges in a single put request.
pub const MAX_BATCH_SIZE: usize = 10_000;
