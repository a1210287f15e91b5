//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the
//! validation that happens before anything reaches the cache.

use chrono::{DateTime, Utc};
use lantern_core::{
    CacheError, Graph, IlluminateQuery, Optimization, Value,
    clock::offset,
    primitives::{MAX_BATCH_SIZE, MAX_KEY_LENGTH},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store sizes. Counts include entries that have expired but not yet been
/// swept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub vertices: usize,
    pub edge_pairs: usize,
    pub contributions: usize,
    pub default_ttl_seconds: u64,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Keys must be non-empty and at most `MAX_KEY_LENGTH` bytes.
pub fn validate_key(field: &str, key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidQuery(format!("{} must not be empty", field)));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidQuery(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            key.len(),
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_batch(len: usize) -> Result<(), CacheError> {
    if len > MAX_BATCH_SIZE {
        return Err(CacheError::InvalidQuery(format!(
            "batch of {} exceeds maximum {}",
            len, MAX_BATCH_SIZE
        )));
    }
    Ok(())
}

/// Absolute expiration of a write: an explicit instant, a TTL relative to
/// `now`, or the default TTL when neither is given.
pub fn resolve_expiration(
    expiration: Option<DateTime<Utc>>,
    ttl_seconds: Option<u64>,
    now: DateTime<Utc>,
    default_ttl: Duration,
) -> Result<DateTime<Utc>, CacheError> {
    match (expiration, ttl_seconds) {
        (Some(_), Some(_)) => Err(CacheError::InvalidQuery(
            "expiration and ttl_seconds are mutually exclusive".to_string(),
        )),
        (Some(at), None) => Ok(at),
        (None, Some(seconds)) => Ok(offset(now, Duration::from_secs(seconds))),
        (None, None) => Ok(offset(now, default_ttl)),
    }
}

// =============================================================================
// VERTEX REQUEST/RESPONSE
// =============================================================================

/// One vertex write.
///
/// `value` is kept as raw JSON until validation so an unknown type tag
/// surfaces as `InvalidValueType` rather than a generic body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexJson {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

/// A validated vertex write.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexEntry {
    pub key: String,
    pub value: Value,
    pub expiration: DateTime<Utc>,
}

impl VertexJson {
    pub fn to_entry(
        &self,
        now: DateTime<Utc>,
        default_ttl: Duration,
    ) -> Result<VertexEntry, CacheError> {
        validate_key("key", &self.key)?;
        let value = parse_value(&self.value)?;
        let expiration = resolve_expiration(self.expiration, self.ttl_seconds, now, default_ttl)?;
        Ok(VertexEntry {
            key: self.key.clone(),
            value,
            expiration,
        })
    }
}

/// Decode a tagged JSON value. A missing value is `nil`.
pub fn parse_value(raw: &serde_json::Value) -> Result<Value, CacheError> {
    if raw.is_null() {
        return Ok(Value::Nil);
    }
    serde_json::from_value(raw.clone()).map_err(|e| CacheError::InvalidValueType(e.to_string()))
}

/// Batch vertex write request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutVerticesRequest {
    pub vertices: Vec<VertexJson>,
}

impl PutVerticesRequest {
    /// Validate every item; one bad item rejects the whole batch.
    pub fn to_entries(
        &self,
        now: DateTime<Utc>,
        default_ttl: Duration,
    ) -> Result<Vec<VertexEntry>, CacheError> {
        validate_batch(self.vertices.len())?;
        self.vertices
            .iter()
            .map(|v| v.to_entry(now, default_ttl))
            .collect()
    }
}

/// A live vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexResponse {
    pub key: String,
    pub value: Value,
    pub expiration: DateTime<Utc>,
}

// =============================================================================
// EDGE REQUEST/RESPONSE
// =============================================================================

/// One edge contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeJson {
    pub tail: String,
    pub head: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

/// A validated edge contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEntry {
    pub tail: String,
    pub head: String,
    pub weight: f64,
    pub expiration: DateTime<Utc>,
}

impl EdgeJson {
    pub fn to_entry(&self, now: DateTime<Utc>, default_ttl: Duration) -> Result<EdgeEntry, CacheError> {
        validate_key("tail", &self.tail)?;
        validate_key("head", &self.head)?;
        if !self.weight.is_finite() {
            return Err(CacheError::InvalidQuery(format!(
                "weight {} is not finite",
                self.weight
            )));
        }
        let expiration = resolve_expiration(self.expiration, self.ttl_seconds, now, default_ttl)?;
        Ok(EdgeEntry {
            tail: self.tail.clone(),
            head: self.head.clone(),
            weight: self.weight,
            expiration,
        })
    }
}

/// Batch edge write request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEdgesRequest {
    pub edges: Vec<EdgeJson>,
}

impl AddEdgesRequest {
    /// Validate every item; one bad item rejects the whole batch.
    pub fn to_entries(
        &self,
        now: DateTime<Utc>,
        default_ttl: Duration,
    ) -> Result<Vec<EdgeEntry>, CacheError> {
        validate_batch(self.edges.len())?;
        self.edges
            .iter()
            .map(|e| e.to_entry(now, default_ttl))
            .collect()
    }
}

/// Aggregated live weight of a tracked pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeResponse {
    pub tail: String,
    pub head: String,
    pub weight: f64,
}

/// Result of a batch write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    pub written: usize,
}

impl WriteResponse {
    pub fn success(written: usize) -> Self {
        Self {
            success: true,
            written,
        }
    }
}

// =============================================================================
// ILLUMINATE REQUEST/RESPONSE
// =============================================================================

/// Illumination request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IlluminateRequest {
    pub seed: String,
    pub step: usize,
    pub k: usize,
    #[serde(default)]
    pub tfidf: bool,
    #[serde(default)]
    pub optimization: Optimization,
}

impl IlluminateRequest {
    /// Convert to a validated core query.
    pub fn to_query(&self) -> Result<IlluminateQuery<String>, CacheError> {
        validate_key("seed", &self.seed)?;
        let query = IlluminateQuery::new(self.seed.clone(), self.step, self.k)
            .with_tfidf(self.tfidf)
            .with_optimization(self.optimization);
        query.validate()?;
        Ok(query)
    }
}

/// Illuminated subgraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IlluminateResponse {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub graph: Graph<String, Value>,
}

impl From<Graph<String, Value>> for IlluminateResponse {
    fn from(graph: Graph<String, Value>) -> Self {
        Self {
            vertex_count: graph.vertex_count(),
            edge_count: graph.edge_count(),
            graph,
        }
    }
}
