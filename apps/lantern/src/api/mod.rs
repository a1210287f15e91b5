//! # Lantern HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Store sizes
//! - `POST /vertices` - Put a batch of vertices
//! - `GET /vertices/{key}` - Get a live vertex
//! - `DELETE /vertices/{key}` - Delete a vertex
//! - `POST /edges` - Add a batch of edge contributions
//! - `GET /edges/{tail}/{head}` - Live weight of an edge
//! - `DELETE /edges/{tail}/{head}` - Drop every contribution of an edge
//! - `POST /illuminate` - Neighborhood expansion of a seed
//!
//! ## Security Configuration
//!
//! - `cors_origins`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `rate_limit`: Requests per second (default: 100, 0 to disable)
//! - `api_key`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, keys_match};
pub use handlers::{ApiError, api_error};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    AddEdgesRequest, EdgeEntry, EdgeJson, EdgeResponse, ErrorResponse, HealthResponse,
    IlluminateRequest, IlluminateResponse, PutVerticesRequest, StatusResponse, VertexEntry,
    VertexJson, VertexResponse, WriteResponse, parse_value, resolve_expiration, validate_key,
};

use crate::config::{Config, DEFAULT_RATE_LIMIT};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use lantern_core::{CacheError, GraphCache, SweepStats, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the graph cache.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Cheap handle; clones share the same stores.
    pub cache: GraphCache<String, Value>,
}

impl AppState {
    #[must_use]
    pub fn new(cache: GraphCache<String, Value>) -> Self {
        Self { cache }
    }
}

/// Router middleware settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub api_key: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    pub cors_origins: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl From<&Config> for ServerOptions {
    fn from(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            rate_limit: config.rate_limit,
            cors_origins: config.cors_origins.clone(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: allows all origins
/// - `None`: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => build_localhost_cors(),
    }
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:6380",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:6380",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState, options: &ServerOptions) -> Router {
    let cors = build_cors_layer(options.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/vertices", post(handlers::put_vertices_handler))
        .route(
            "/vertices/{key}",
            get(handlers::get_vertex_handler).delete(handlers::delete_vertex_handler),
        )
        .route("/edges", post(handlers::add_edges_handler))
        .route(
            "/edges/{tail}/{head}",
            get(handlers::get_edge_handler).delete(handlers::delete_edge_handler),
        )
        .route("/illuminate", post(handlers::illuminate_handler));

    match options.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            let key: ApiKey = Arc::from(key);
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - all endpoints are publicly accessible! \
                 Set LANTERN_API_KEY to enable authentication."
            );
        }
    }

    if options.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", options.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(options.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `cache` on `listener` until `shutdown` resolves.
///
/// The eviction sweeper runs for the lifetime of the server; once in-flight
/// requests have drained it is cancelled and awaited.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    cache: GraphCache<String, Value>,
    options: &ServerOptions,
    sweep_interval: Duration,
    shutdown: F,
) -> Result<SweepStats, CacheError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sweeper = cache.start_eviction_sweeper(sweep_interval);
    let router = create_router(AppState::new(cache), options);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CacheError::IoError(format!("Server error: {}", e)));

    let swept = sweeper.shutdown().await?;
    tracing::info!(
        vertices = swept.vertices,
        contributions = swept.contributions,
        "Server stopped"
    );
    served.map(|()| swept)
}

/// Bind and run the server described by `config` until Ctrl-C or SIGTERM.
pub async fn run_server(config: &Config) -> Result<(), CacheError> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CacheError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!(
        default_ttl_seconds = config.default_ttl.as_secs(),
        sweep_interval_seconds = config.sweep_interval.as_secs(),
        "Lantern HTTP server listening on {}",
        addr
    );

    let cache = GraphCache::new(config.default_ttl);
    serve(
        listener,
        cache,
        &ServerOptions::from(config),
        config.sweep_interval,
        shutdown_signal(),
    )
    .await
    .map(|_| ())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to set up SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, initiating graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
