//! # Core Type Definitions
//!
//! This module contains the shared types of the Lantern graph cache:
//! - Key and value bounds (`CacheKey`, `CacheValue`)
//! - The typed vertex payload (`Value`)
//! - Error types (`CacheError`)
//!
//! ## Value Encoding
//!
//! `Value` serializes as an adjacently tagged object so every variant,
//! including `nil`, has an explicit wire form:
//!
//! ```text
//! {"type": "int", "value": 42}
//! {"type": "bytes", "value": "QQ=="}
//! {"type": "nil"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

// =============================================================================
// KEY & VALUE BOUNDS
// =============================================================================

/// Bound for vertex keys.
///
/// `Ord` is required so that snapshots and neighbor ordering are
/// deterministic; `Hash` so the stores can shard on the key.
pub trait CacheKey: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// Bound for vertex payloads.
///
/// `Default` supplies the payload of a vertex that appears in a traversal
/// without a stored value.
pub trait CacheValue: Clone + Default + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Default + Send + Sync + 'static {}

// =============================================================================
// TYPED VALUE
// =============================================================================

/// Payload stored on a vertex.
///
/// `Nil` is a real value, distinct from the vertex not existing. It is also
/// the default, so a vertex reached only through edges reads as `Nil`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    Uint(u64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Raw bytes, base64 on the wire.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// UTC timestamp, RFC 3339 on the wire.
    Timestamp(DateTime<Utc>),
    /// Explicitly empty value.
    #[default]
    Nil,
}

impl Value {
    /// Wire tag of this variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::Nil => "nil",
        }
    }

    fn mismatch(&self, expected: &str) -> CacheError {
        CacheError::InvalidValueType(format!(
            "expected {}, found {}",
            expected,
            self.type_name()
        ))
    }

    pub fn as_int(&self) -> Result<i64, CacheError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(other.mismatch("int")),
        }
    }

    pub fn as_uint(&self) -> Result<u64, CacheError> {
        match self {
            Self::Uint(v) => Ok(*v),
            other => Err(other.mismatch("uint")),
        }
    }

    pub fn as_float(&self) -> Result<f64, CacheError> {
        match self {
            Self::Float(v) => Ok(*v),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn as_str(&self) -> Result<&str, CacheError> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, CacheError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], CacheError> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(other.mismatch("bytes")),
        }
    }

    pub fn as_timestamp(&self) -> Result<DateTime<Utc>, CacheError> {
        match self {
            Self::Timestamp(v) => Ok(*v),
            other => Err(other.mismatch("timestamp")),
        }
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Lantern system.
///
/// - No silent failures
/// - Use `Result<T, CacheError>` for fallible operations
/// - Nothing is retried internally; retry policy belongs to callers
#[derive(Debug, Error)]
pub enum CacheError {
    /// The vertex has no live value.
    #[error("Vertex not found: {0}")]
    VertexNotFound(String),

    /// The edge pair is not tracked.
    #[error("Edge not found: {0} -> {1}")]
    EdgeNotFound(String, String),

    /// A value is outside the supported variants, or an accessor was called
    /// on the wrong variant.
    #[error("Invalid value type: {0}")]
    InvalidValueType(String),

    /// A path-tree weight transform produced a negative or NaN cost.
    #[error("Invalid transform: weight {weight} mapped to {transformed}")]
    InvalidTransform { weight: f64, transformed: f64 },

    /// Query parameters are out of range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn all_variants() -> Vec<Value> {
        vec![
            Value::Int(-7),
            Value::Uint(7),
            Value::Float(1.5),
            Value::String("A".to_string()),
            Value::Bool(true),
            Value::Bytes(b"A".to_vec()),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("ts")),
            Value::Nil,
        ]
    }

    #[test]
    fn default_is_nil() {
        assert!(Value::default().is_nil());
    }

    #[test]
    fn accessors_match_their_variant() {
        assert_eq!(Value::Int(-7).as_int().expect("int"), -7);
        assert_eq!(Value::Uint(7).as_uint().expect("uint"), 7);
        assert_eq!(Value::Float(1.5).as_float().expect("float"), 1.5);
        assert_eq!(Value::from("A").as_str().expect("str"), "A");
        assert!(Value::Bool(true).as_bool().expect("bool"));
        assert_eq!(Value::Bytes(b"A".to_vec()).as_bytes().expect("bytes"), b"A");
    }

    #[test]
    fn accessors_reject_other_variants() {
        for value in all_variants() {
            let tag = value.type_name();
            assert_eq!(value.as_int().is_ok(), tag == "int");
            assert_eq!(value.as_uint().is_ok(), tag == "uint");
            assert_eq!(value.as_float().is_ok(), tag == "float");
            assert_eq!(value.as_str().is_ok(), tag == "string");
            assert_eq!(value.as_bool().is_ok(), tag == "bool");
            assert_eq!(value.as_bytes().is_ok(), tag == "bytes");
            assert_eq!(value.as_timestamp().is_ok(), tag == "timestamp");
            assert_eq!(value.is_nil(), tag == "nil");
        }
    }

    #[test]
    fn mismatch_reports_both_types() {
        let err = Value::Bool(false).as_int().expect_err("mismatch");
        assert!(matches!(err, CacheError::InvalidValueType(ref m) if m == "expected int, found bool"));
    }

    #[test]
    fn wire_form_is_tagged() {
        let json = serde_json::to_value(Value::Bytes(b"A".to_vec())).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "bytes", "value": "QQ=="}));

        let json = serde_json::to_value(Value::Nil).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "nil"}));
    }

    #[test]
    fn wire_form_survives_decoding() {
        for value in all_variants() {
            let json = serde_json::to_string(&value).expect("serialize");
            let back: Value = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result: Result<Value, _> =
            serde_json::from_value(serde_json::json!({"type": "complex", "value": [1, 2]}));
        assert!(result.is_err());
    }

    #[test]
    fn option_maps_none_to_nil() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }
}
