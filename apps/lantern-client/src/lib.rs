//! # Lantern HTTP Client
//!
//! Typed wrapper around the Lantern REST API.
//!
//! ```no_run
//! # async fn demo() -> Result<(), lantern_client::ClientError> {
//! use lantern_client::LanternClient;
//! use lantern_core::IlluminateQuery;
//!
//! let client = LanternClient::new("http://127.0.0.1:6380", None);
//! client.add_edge("a", "b", 1.0, None).await?;
//! let graph = client.illuminate(&IlluminateQuery::new("a".to_string(), 2, 2)).await?;
//! # let _ = graph;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use lantern_core::{CacheError, Graph, IlluminateQuery, Optimization, Value};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from the HTTP client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Cannot reach the Lantern server.
    #[error("Cannot connect to Lantern at {0}")]
    ConnectionFailed(String),
    /// 404: the vertex or edge has no live entry.
    #[error("Not found: {0}")]
    NotFound(String),
    /// 400: the server rejected the request.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// 401 Unauthorized - invalid or missing API key.
    #[error("Unauthorized: invalid or missing API key")]
    Unauthorized,
    /// 429 Too Many Requests.
    #[error("Rate limited: too many requests")]
    RateLimited,
    /// Server returned a 5xx error.
    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),
    /// Failed to parse a response body or build a request URL.
    #[error("Parse error: {0}")]
    ParseError(String),
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub vertices: usize,
    pub edge_pairs: usize,
    pub contributions: usize,
    pub default_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct WriteResponse {
    written: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeResponse {
    weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct IlluminateResponse {
    graph: Graph<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// A vertex as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vertex {
    pub key: String,
    pub value: Value,
    pub expiration: DateTime<Utc>,
}

impl Vertex {
    pub fn int_value(&self) -> Result<i64, CacheError> {
        self.value.as_int()
    }

    pub fn uint_value(&self) -> Result<u64, CacheError> {
        self.value.as_uint()
    }

    pub fn float_value(&self) -> Result<f64, CacheError> {
        self.value.as_float()
    }

    pub fn string_value(&self) -> Result<&str, CacheError> {
        self.value.as_str()
    }

    pub fn bool_value(&self) -> Result<bool, CacheError> {
        self.value.as_bool()
    }

    pub fn bytes_value(&self) -> Result<&[u8], CacheError> {
        self.value.as_bytes()
    }

    pub fn time_value(&self) -> Result<DateTime<Utc>, CacheError> {
        self.value.as_timestamp()
    }

    pub fn is_nil(&self) -> bool {
        self.value.is_nil()
    }
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Serialize)]
struct VertexBody<'a> {
    key: &'a str,
    value: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EdgeBody<'a> {
    tail: &'a str,
    head: &'a str,
    weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct IlluminateBody<'a> {
    seed: &'a str,
    step: usize,
    k: usize,
    tfidf: bool,
    optimization: Optimization,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client that wraps calls to the Lantern REST API.
#[derive(Debug, Clone)]
pub struct LanternClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LanternClient {
    /// Create a new client pointing at the given Lantern server URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `base_url` + path segments, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::ParseError(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::ParseError("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: Method, segments: &[&str]) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut req = self.http.request(method, self.url(segments)?);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        Ok(req)
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Map error statuses to `ClientError`, passing successful responses through.
    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED => return Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(ClientError::RateLimited),
            _ => {}
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            s if s.is_server_error() => ClientError::ServerError(s.as_u16(), message),
            _ => ClientError::BadRequest(message),
        })
    }

    async fn call<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let resp = self.check(self.send(req).await?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    async fn call_empty(&self, req: reqwest::RequestBuilder) -> Result<(), ClientError> {
        self.check(self.send(req).await?).await.map(|_| ())
    }

    // =========================================================================
    // SERVICE
    // =========================================================================

    /// GET /health
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.call(self.request(Method::GET, &["health"])?).await
    }

    /// GET /status → store sizes.
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        self.call(self.request(Method::GET, &["status"])?).await
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    /// PUT one vertex. `None` expiration uses the server's default TTL.
    pub async fn put_vertex(
        &self,
        key: &str,
        value: impl Into<Value>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        let value = value.into();
        self.put_vertex_body(VertexBody {
            key,
            value: &value,
            expiration,
            ttl_seconds: None,
        })
        .await
    }

    /// PUT one vertex living `ttl` from the server's clock.
    pub async fn put_vertex_with_ttl(
        &self,
        key: &str,
        value: impl Into<Value>,
        ttl: Duration,
    ) -> Result<(), ClientError> {
        let value = value.into();
        self.put_vertex_body(VertexBody {
            key,
            value: &value,
            expiration: None,
            ttl_seconds: Some(ttl.as_secs()),
        })
        .await
    }

    async fn put_vertex_body(&self, body: VertexBody<'_>) -> Result<(), ClientError> {
        let payload = serde_json::json!({ "vertices": [body] });
        let req = self.request(Method::POST, &["vertices"])?.json(&payload);
        let written: WriteResponse = self.call(req).await?;
        tracing::debug!(written = written.written, "Put vertex");
        Ok(())
    }

    /// GET one vertex. Absent and expired vertices are `NotFound`.
    pub async fn get_vertex(&self, key: &str) -> Result<Vertex, ClientError> {
        self.call(self.request(Method::GET, &["vertices", key])?).await
    }

    pub async fn delete_vertex(&self, key: &str) -> Result<(), ClientError> {
        self.call_empty(self.request(Method::DELETE, &["vertices", key])?)
            .await
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Add one contribution to `tail → head`. `None` expiration uses the
    /// server's default TTL.
    pub async fn add_edge(
        &self,
        tail: &str,
        head: &str,
        weight: f64,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        self.add_edge_body(EdgeBody {
            tail,
            head,
            weight,
            expiration,
            ttl_seconds: None,
        })
        .await
    }

    pub async fn add_edge_with_ttl(
        &self,
        tail: &str,
        head: &str,
        weight: f64,
        ttl: Duration,
    ) -> Result<(), ClientError> {
        self.add_edge_body(EdgeBody {
            tail,
            head,
            weight,
            expiration: None,
            ttl_seconds: Some(ttl.as_secs()),
        })
        .await
    }

    async fn add_edge_body(&self, body: EdgeBody<'_>) -> Result<(), ClientError> {
        let payload = serde_json::json!({ "edges": [body] });
        let req = self.request(Method::POST, &["edges"])?.json(&payload);
        let written: WriteResponse = self.call(req).await?;
        tracing::debug!(written = written.written, "Added edge");
        Ok(())
    }

    /// Live weight of `tail → head`. Untracked pairs are `NotFound`.
    pub async fn get_edge(&self, tail: &str, head: &str) -> Result<f64, ClientError> {
        let edge: EdgeResponse = self
            .call(self.request(Method::GET, &["edges", tail, head])?)
            .await?;
        Ok(edge.weight)
    }

    pub async fn delete_edge(&self, tail: &str, head: &str) -> Result<(), ClientError> {
        self.call_empty(self.request(Method::DELETE, &["edges", tail, head])?)
            .await
    }

    // =========================================================================
    // ILLUMINATION
    // =========================================================================

    /// POST /illuminate → the expanded (and optionally reduced) subgraph.
    pub async fn illuminate(
        &self,
        query: &IlluminateQuery<String>,
    ) -> Result<Graph<String, Value>, ClientError> {
        let body = IlluminateBody {
            seed: &query.seed,
            step: query.step,
            k: query.k,
            tfidf: query.tfidf,
            optimization: query.optimization,
        };
        let req = self.request(Method::POST, &["illuminate"])?.json(&body);
        let response: IlluminateResponse = self.call(req).await?;
        Ok(response.graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_key_segments() {
        let client = LanternClient::new("http://127.0.0.1:6380/", None);
        let url = client.url(&["vertices", "a b/c"]).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:6380/vertices/a%20b%2Fc");
    }

    #[test]
    fn url_keeps_base_path() {
        let client = LanternClient::new("http://proxy.local/lantern", None);
        let url = client.url(&["edges", "a", "b"]).expect("url");
        assert_eq!(url.as_str(), "http://proxy.local/lantern/edges/a/b");
    }

    #[test]
    fn invalid_base_url_is_parse_error() {
        let client = LanternClient::new("not a url", None);
        assert!(matches!(client.url(&["health"]), Err(ClientError::ParseError(_))));
    }

    #[test]
    fn vertex_accessors_check_type() {
        let vertex = Vertex {
            key: "a".to_string(),
            value: Value::Int(3),
            expiration: Utc::now(),
        };
        assert_eq!(vertex.int_value().expect("int"), 3);
        assert!(vertex.string_value().is_err());
        assert!(!vertex.is_nil());
    }

    #[test]
    fn vertex_deserializes_from_wire() {
        let vertex: Vertex = serde_json::from_str(
            r#"{"key":"a","value":{"type":"bytes","value":"AAH/"},"expiration":"2030-01-01T00:00:00Z"}"#,
        )
        .expect("vertex");
        assert_eq!(vertex.bytes_value().expect("bytes"), &[0u8, 1, 255][..]);
    }

    #[test]
    fn edge_body_omits_unset_expiry() {
        let body = EdgeBody {
            tail: "a",
            head: "b",
            weight: 1.5,
            expiration: None,
            ttl_seconds: Some(30),
        };
        let json = serde_json::to_value(&body).expect("json");
        assert_eq!(
            json,
            serde_json::json!({"tail": "a", "head": "b", "weight": 1.5, "ttl_seconds": 30})
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ClientError::ServerError(500, "boom".to_string()).to_string(),
            "Server error (500): boom"
        );
        assert_eq!(
            ClientError::Unauthorized.to_string(),
            "Unauthorized: invalid or missing API key"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_failure() {
        let client = LanternClient::new("http://127.0.0.1:1", None);
        assert!(matches!(
            client.health().await,
            Err(ClientError::ConnectionFailed(_))
        ));
    }
}
