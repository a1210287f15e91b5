//! Validation tests for the API request types.

use chrono::{TimeZone, Utc};
use lantern::api::{
    AddEdgesRequest, EdgeJson, IlluminateRequest, PutVerticesRequest, VertexJson, parse_value,
    resolve_expiration, validate_key,
};
use lantern_core::{CacheError, Optimization, Value};
use serde_json::json;
use std::time::Duration;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid date")
}

const DEFAULT_TTL: Duration = Duration::from_secs(60);

fn edge(tail: &str, head: &str, weight: f64) -> EdgeJson {
    EdgeJson {
        tail: tail.to_string(),
        head: head.to_string(),
        weight,
        expiration: None,
        ttl_seconds: None,
    }
}

// =============================================================================
// EXPIRATION
// =============================================================================

#[test]
fn default_ttl_applies_without_expiration() {
    let at = resolve_expiration(None, None, now(), DEFAULT_TTL).expect("resolve");
    assert_eq!(at, now() + chrono::TimeDelta::seconds(60));
}

#[test]
fn ttl_seconds_is_relative_to_now() {
    let at = resolve_expiration(None, Some(5), now(), DEFAULT_TTL).expect("resolve");
    assert_eq!(at, now() + chrono::TimeDelta::seconds(5));
}

#[test]
fn absolute_expiration_is_kept_verbatim() {
    let past = Utc
        .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date");
    let at = resolve_expiration(Some(past), None, now(), DEFAULT_TTL).expect("resolve");
    assert_eq!(at, past);
}

#[test]
fn expiration_and_ttl_conflict() {
    let result = resolve_expiration(Some(now()), Some(5), now(), DEFAULT_TTL);
    assert!(matches!(result, Err(CacheError::InvalidQuery(_))));
}

// =============================================================================
// KEYS
// =============================================================================

#[test]
fn empty_key_rejected() {
    assert!(matches!(
        validate_key("key", ""),
        Err(CacheError::InvalidQuery(_))
    ));
}

#[test]
fn key_length_bounded_in_bytes() {
    assert!(validate_key("key", &"k".repeat(256)).is_ok());
    assert!(validate_key("key", &"k".repeat(257)).is_err());
    // 2 bytes per char
    assert!(validate_key("key", &"é".repeat(129)).is_err());
}

// =============================================================================
// VALUES
// =============================================================================

#[test]
fn null_value_is_nil() {
    assert_eq!(parse_value(&serde_json::Value::Null).expect("nil"), Value::Nil);
}

#[test]
fn tagged_values_decode() {
    assert_eq!(
        parse_value(&json!({"type": "uint", "value": 7})).expect("uint"),
        Value::Uint(7)
    );
    assert_eq!(
        parse_value(&json!({"type": "float", "value": 1.5})).expect("float"),
        Value::Float(1.5)
    );
    assert_eq!(
        parse_value(&json!({"type": "timestamp", "value": "2024-06-01T12:00:00Z"}))
            .expect("timestamp"),
        Value::Timestamp(now())
    );
}

#[test]
fn unknown_tag_is_invalid_value_type() {
    let result = parse_value(&json!({"type": "matrix", "value": [[1]]}));
    assert!(matches!(result, Err(CacheError::InvalidValueType(_))));
}

#[test]
fn untagged_value_is_invalid_value_type() {
    let result = parse_value(&json!(42));
    assert!(matches!(result, Err(CacheError::InvalidValueType(_))));
}

// =============================================================================
// BATCHES
// =============================================================================

#[test]
fn vertex_batch_resolves_each_item() {
    let request: PutVerticesRequest = serde_json::from_value(json!({
        "vertices": [
            {"key": "a", "value": {"type": "int", "value": -3}},
            {"key": "b", "ttl_seconds": 10},
        ]
    }))
    .expect("request");

    let entries = request.to_entries(now(), DEFAULT_TTL).expect("entries");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].value, Value::Int(-3));
    assert_eq!(entries[0].expiration, now() + chrono::TimeDelta::seconds(60));
    assert_eq!(entries[1].value, Value::Nil);
    assert_eq!(entries[1].expiration, now() + chrono::TimeDelta::seconds(10));
}

#[test]
fn one_bad_vertex_rejects_batch() {
    let request = PutVerticesRequest {
        vertices: vec![
            VertexJson {
                key: "ok".to_string(),
                value: serde_json::Value::Null,
                expiration: None,
                ttl_seconds: None,
            },
            VertexJson {
                key: "bad".to_string(),
                value: json!({"type": "bool", "value": "yes"}),
                expiration: None,
                ttl_seconds: None,
            },
        ],
    };

    assert!(matches!(
        request.to_entries(now(), DEFAULT_TTL),
        Err(CacheError::InvalidValueType(_))
    ));
}

#[test]
fn non_finite_weight_rejected() {
    for weight in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let request = AddEdgesRequest {
            edges: vec![edge("a", "b", 1.0), edge("a", "c", weight)],
        };
        assert!(matches!(
            request.to_entries(now(), DEFAULT_TTL),
            Err(CacheError::InvalidQuery(_))
        ));
    }
}

#[test]
fn negative_and_zero_weights_allowed() {
    let request = AddEdgesRequest {
        edges: vec![edge("a", "b", -2.5), edge("a", "c", 0.0)],
    };

    let entries = request.to_entries(now(), DEFAULT_TTL).expect("entries");
    assert_eq!(entries[0].weight, -2.5);
    assert_eq!(entries[1].weight, 0.0);
}

#[test]
fn oversized_batch_rejected() {
    let request = AddEdgesRequest {
        edges: vec![edge("a", "b", 1.0); 10_001],
    };

    assert!(request.to_entries(now(), DEFAULT_TTL).is_err());
}

// =============================================================================
// ILLUMINATE
// =============================================================================

#[test]
fn illuminate_request_defaults() {
    let request: IlluminateRequest =
        serde_json::from_value(json!({"seed": "a", "step": 2, "k": 3})).expect("request");

    let query = request.to_query().expect("query");
    assert_eq!(query.seed, "a");
    assert!(!query.tfidf);
    assert_eq!(query.optimization, Optimization::None);
}

#[test]
fn illuminate_request_parses_optimization_name() {
    let request: IlluminateRequest = serde_json::from_value(json!({
        "seed": "a",
        "step": 1,
        "k": 1,
        "tfidf": true,
        "optimization": "inverse_weighted_path_tree"
    }))
    .expect("request");

    let query = request.to_query().expect("query");
    assert!(query.tfidf);
    assert_eq!(query.optimization, Optimization::InverseWeightedPathTree);
}

#[test]
fn illuminate_request_bounds() {
    let too_wide = IlluminateRequest {
        seed: "a".to_string(),
        step: 1,
        k: 1001,
        tfidf: false,
        optimization: Optimization::None,
    };
    assert!(too_wide.to_query().is_err());

    let no_seed = IlluminateRequest {
        seed: String::new(),
        step: 1,
        k: 1,
        tfidf: false,
        optimization: Optimization::None,
    };
    assert!(no_seed.to_query().is_err());
}
