//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AddEdgesRequest, EdgeResponse, ErrorResponse, HealthResponse, IlluminateRequest,
        IlluminateResponse, PutVerticesRequest, StatusResponse, VertexResponse, WriteResponse,
        validate_key,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use lantern_core::CacheError;

/// Error half of every fallible handler.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a cache error to its HTTP status.
pub fn api_error(error: CacheError) -> ApiError {
    let status = match &error {
        CacheError::VertexNotFound(_) | CacheError::EdgeNotFound(_, _) => StatusCode::NOT_FOUND,
        CacheError::InvalidValueType(_)
        | CacheError::InvalidQuery(_)
        | CacheError::InvalidTransform { .. } => StatusCode::BAD_REQUEST,
        CacheError::ConfigError(_) | CacheError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Store sizes.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.cache.stats();
    Json(StatusResponse {
        vertices: stats.vertices,
        edge_pairs: stats.edge_pairs,
        contributions: stats.contributions,
        default_ttl_seconds: state.cache.default_ttl().as_secs(),
    })
}

// =============================================================================
// VERTEX HANDLERS
// =============================================================================

/// Put a batch of vertices. Nothing is written unless every item is valid.
pub async fn put_vertices_handler(
    State(state): State<AppState>,
    Json(request): Json<PutVerticesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = request
        .to_entries(state.cache.now(), state.cache.default_ttl())
        .map_err(api_error)?;

    let written = entries.len();
    for entry in entries {
        state.cache.put_vertex(entry.key, entry.value, entry.expiration);
    }
    tracing::debug!(written, "Put vertices");

    Ok(Json(WriteResponse::success(written)))
}

/// Get a live vertex.
pub async fn get_vertex_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_key("key", &key).map_err(api_error)?;
    let (value, expiration) = state
        .cache
        .get_vertex_entry(&key)
        .ok_or_else(|| api_error(CacheError::VertexNotFound(key.clone())))?;

    Ok(Json(VertexResponse {
        key,
        value,
        expiration,
    }))
}

/// Delete a vertex. Idempotent.
pub async fn delete_vertex_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    state.cache.delete_vertex(&key);
    StatusCode::NO_CONTENT
}

// =============================================================================
// EDGE HANDLERS
// =============================================================================

/// Add a batch of edge contributions. Nothing is written unless every item
/// is valid.
pub async fn add_edges_handler(
    State(state): State<AppState>,
    Json(request): Json<AddEdgesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = request
        .to_entries(state.cache.now(), state.cache.default_ttl())
        .map_err(api_error)?;

    let written = entries.len();
    for entry in entries {
        state
            .cache
            .add_edge(entry.tail, entry.head, entry.weight, entry.expiration);
    }
    tracing::debug!(written, "Added edge contributions");

    Ok(Json(WriteResponse::success(written)))
}

/// Aggregated live weight of a tracked pair.
pub async fn get_edge_handler(
    State(state): State<AppState>,
    Path((tail, head)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let weight = state
        .cache
        .get_edge_weight(&tail, &head)
        .ok_or_else(|| api_error(CacheError::EdgeNotFound(tail.clone(), head.clone())))?;

    Ok(Json(EdgeResponse { tail, head, weight }))
}

/// Drop every contribution of a pair. Idempotent.
pub async fn delete_edge_handler(
    State(state): State<AppState>,
    Path((tail, head)): Path<(String, String)>,
) -> impl IntoResponse {
    state.cache.delete_edge(&tail, &head);
    StatusCode::NO_CONTENT
}

// =============================================================================
// ILLUMINATE HANDLER
// =============================================================================

/// Expand, reweight and reduce the neighborhood of a seed.
pub async fn illuminate_handler(
    State(state): State<AppState>,
    Json(request): Json<IlluminateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = request.to_query().map_err(api_error)?;
    let graph = state.cache.illuminate(&query).map_err(api_error)?;
    Ok(Json(IlluminateResponse::from(graph)))
}
