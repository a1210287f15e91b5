//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{CliError, ValueKind};
use crate::api;
use crate::config::{Config, ConfigLayer};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use lantern_client::LanternClient;
use lantern_core::{CacheError, Graph, IlluminateQuery, Value};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Maximum file size for `load` (100 MB).
const MAX_LOAD_FILE_SIZE: u64 = 100 * 1024 * 1024;

// =============================================================================
// VALUE PARSING
// =============================================================================

/// Parse a command-line value as `kind`. A missing raw value is only valid
/// for `nil`.
pub fn parse_cli_value(kind: ValueKind, raw: Option<&str>) -> Result<Value, CacheError> {
    let invalid = |e: &dyn std::fmt::Display| {
        CacheError::InvalidValueType(format!("cannot parse {:?} as {:?}: {}", raw, kind, e))
    };

    if kind == ValueKind::Nil {
        return Ok(Value::Nil);
    }
    let raw = raw.ok_or_else(|| {
        CacheError::InvalidValueType(format!("a {:?} value needs an argument", kind))
    })?;

    match kind {
        ValueKind::Int => raw.parse::<i64>().map(Value::Int).map_err(|e| invalid(&e)),
        ValueKind::Uint => raw.parse::<u64>().map(Value::Uint).map_err(|e| invalid(&e)),
        ValueKind::Float => raw.parse::<f64>().map(Value::Float).map_err(|e| invalid(&e)),
        ValueKind::String => Ok(Value::String(raw.to_string())),
        ValueKind::Bool => raw.parse::<bool>().map(Value::Bool).map_err(|e| invalid(&e)),
        ValueKind::Bytes => STANDARD
            .decode(raw)
            .map(Value::Bytes)
            .map_err(|e| invalid(&e)),
        ValueKind::Timestamp => DateTime::parse_from_rfc3339(raw)
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .map_err(|e| invalid(&e)),
        ValueKind::Nil => Ok(Value::Nil),
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Resolve configuration and start the HTTP server.
pub async fn cmd_server(
    config_file: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    default_ttl: Option<u64>,
    sweep_interval: Option<u64>,
) -> Result<(), CliError> {
    let flags = ConfigLayer {
        host,
        port,
        default_ttl_seconds: default_ttl,
        sweep_interval_seconds: sweep_interval,
        ..ConfigLayer::default()
    };
    let config = Config::load(config_file, flags)?;

    println!("Lantern Graph Cache Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:        {}", config.bind_address());
    println!("  Default TTL:    {}s", config.default_ttl.as_secs());
    println!("  Sweep interval: {}s", config.sweep_interval.as_secs());
    println!();
    println!("Endpoints:");
    println!("  POST   /vertices            - Put vertices");
    println!("  GET    /vertices/{{key}}      - Get a vertex");
    println!("  POST   /edges               - Add edge contributions");
    println!("  GET    /edges/{{tail}}/{{head}} - Get an edge weight");
    println!("  POST   /illuminate          - Expand a neighborhood");
    println!("  GET    /status              - Store sizes");
    println!("  GET    /health              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config).await?;
    Ok(())
}

// =============================================================================
// SERVICE COMMANDS
// =============================================================================

pub async fn cmd_health(client: &LanternClient, json_mode: bool) -> Result<(), CliError> {
    let health = client.health().await?;
    if json_mode {
        print_json(&serde_json::json!({
            "status": health.status,
            "version": health.version,
        }));
    } else {
        println!("{} (v{}) at {}", health.status, health.version, client.base_url());
    }
    Ok(())
}

pub async fn cmd_status(client: &LanternClient, json_mode: bool) -> Result<(), CliError> {
    let status = client.status().await?;

    if json_mode {
        print_json(&serde_json::json!({
            "url": client.base_url(),
            "vertices": status.vertices,
            "edge_pairs": status.edge_pairs,
            "contributions": status.contributions,
            "default_ttl_seconds": status.default_ttl_seconds,
        }));
        return Ok(());
    }

    println!("Lantern Cache Status");
    println!("====================");
    println!("Server: {}", client.base_url());
    println!();
    println!("Vertices:      {}", status.vertices);
    println!("Edge pairs:    {}", status.edge_pairs);
    println!("Contributions: {}", status.contributions);
    println!("Default TTL:   {}s", status.default_ttl_seconds);

    Ok(())
}

// =============================================================================
// VERTEX COMMANDS
// =============================================================================

pub async fn cmd_put_vertex(
    client: &LanternClient,
    key: &str,
    raw: Option<&str>,
    kind: ValueKind,
    ttl: Option<u64>,
) -> Result<(), CliError> {
    let value = parse_cli_value(kind, raw)?;
    match ttl {
        Some(seconds) => {
            client
                .put_vertex_with_ttl(key, value, Duration::from_secs(seconds))
                .await?;
        }
        None => client.put_vertex(key, value, None).await?,
    }
    println!("Put vertex {}", key);
    Ok(())
}

pub async fn cmd_get_vertex(
    client: &LanternClient,
    json_mode: bool,
    key: &str,
) -> Result<(), CliError> {
    let vertex = client.get_vertex(key).await?;

    if json_mode {
        print_json(&serde_json::json!({
            "key": vertex.key,
            "value": vertex.value,
            "expiration": vertex.expiration,
        }));
    } else {
        println!("{} = {:?}", vertex.key, vertex.value);
        println!("  expires {}", vertex.expiration.to_rfc3339());
    }
    Ok(())
}

pub async fn cmd_delete_vertex(client: &LanternClient, key: &str) -> Result<(), CliError> {
    client.delete_vertex(key).await?;
    println!("Deleted vertex {}", key);
    Ok(())
}

// =============================================================================
// EDGE COMMANDS
// =============================================================================

pub async fn cmd_add_edge(
    client: &LanternClient,
    tail: &str,
    head: &str,
    weight: f64,
    ttl: Option<u64>,
) -> Result<(), CliError> {
    if !weight.is_finite() {
        return Err(CacheError::InvalidQuery(format!("weight {} is not finite", weight)).into());
    }
    match ttl {
        Some(seconds) => {
            client
                .add_edge_with_ttl(tail, head, weight, Duration::from_secs(seconds))
                .await?;
        }
        None => client.add_edge(tail, head, weight, None).await?,
    }
    println!("Added {} to {} -> {}", weight, tail, head);
    Ok(())
}

pub async fn cmd_get_edge(
    client: &LanternClient,
    json_mode: bool,
    tail: &str,
    head: &str,
) -> Result<(), CliError> {
    let weight = client.get_edge(tail, head).await?;
    if json_mode {
        print_json(&serde_json::json!({ "tail": tail, "head": head, "weight": weight }));
    } else {
        println!("{} -> {}: {}", tail, head, weight);
    }
    Ok(())
}

pub async fn cmd_delete_edge(client: &LanternClient, tail: &str, head: &str) -> Result<(), CliError> {
    client.delete_edge(tail, head).await?;
    println!("Deleted edge {} -> {}", tail, head);
    Ok(())
}

// =============================================================================
// ILLUMINATE COMMAND
// =============================================================================

/// Render an illuminated graph as an indented edge listing.
pub fn render_graph(graph: &Graph<String, Value>) -> String {
    let mut out = format!(
        "{} vertices, {} edges\n",
        graph.vertex_count(),
        graph.edge_count()
    );
    for (key, value) in &graph.vertices {
        out.push_str(&format!("  {} = {:?}\n", key, value));
        for (head, weight) in graph.edges.get(key).into_iter().flatten() {
            out.push_str(&format!("    -> {} ({})\n", head, weight));
        }
    }
    out
}

pub async fn cmd_illuminate(
    client: &LanternClient,
    json_mode: bool,
    query: &IlluminateQuery<String>,
) -> Result<(), CliError> {
    query.validate()?;
    let graph = client.illuminate(query).await?;

    if json_mode {
        print_json(&serde_json::to_value(&graph).unwrap_or_default());
    } else {
        print!("{}", render_graph(&graph));
    }
    Ok(())
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadFile {
    #[serde(default)]
    pub vertices: Vec<api::VertexJson>,
    #[serde(default)]
    pub edges: Vec<api::EdgeJson>,
}

/// Read and parse a load file, refusing directories and oversized files.
pub fn read_load_file(path: &Path) -> Result<LoadFile, CacheError> {
    let canonical = path.canonicalize().map_err(|e| {
        CacheError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(CacheError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| CacheError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_LOAD_FILE_SIZE {
        return Err(CacheError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_LOAD_FILE_SIZE
        )));
    }

    let contents = std::fs::read(&canonical)
        .map_err(|e| CacheError::IoError(format!("Read file: {}", e)))?;
    serde_json::from_slice(&contents)
        .map_err(|e| CacheError::IoError(format!("Malformed load file: {}", e)))
}

/// Push every vertex, then every edge contribution, one at a time.
pub async fn cmd_load(client: &LanternClient, path: &Path) -> Result<(), CliError> {
    let load = read_load_file(path)?;
    tracing::info!(
        vertices = load.vertices.len(),
        edges = load.edges.len(),
        "Loading from {:?}",
        path
    );

    for vertex in &load.vertices {
        let value = api::parse_value(&vertex.value)?;
        match vertex.ttl_seconds {
            Some(seconds) => {
                client
                    .put_vertex_with_ttl(&vertex.key, value, Duration::from_secs(seconds))
                    .await?;
            }
            None => client.put_vertex(&vertex.key, value, vertex.expiration).await?,
        }
    }

    for edge in &load.edges {
        match edge.ttl_seconds {
            Some(seconds) => {
                client
                    .add_edge_with_ttl(&edge.tail, &edge.head, edge.weight, Duration::from_secs(seconds))
                    .await?;
            }
            None => {
                client
                    .add_edge(&edge.tail, &edge.head, edge.weight, edge.expiration)
                    .await?;
            }
        }
    }

    println!(
        "Loaded {} vertices, {} edge contributions",
        load.vertices.len(),
        load.edges.len()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_each_kind() {
        assert_eq!(
            parse_cli_value(ValueKind::Int, Some("-3")).expect("int"),
            Value::Int(-3)
        );
        assert_eq!(
            parse_cli_value(ValueKind::Bytes, Some("AAH/")).expect("bytes"),
            Value::Bytes(vec![0, 1, 255])
        );
        assert_eq!(
            parse_cli_value(ValueKind::Bool, Some("true")).expect("bool"),
            Value::Bool(true)
        );
        assert_eq!(parse_cli_value(ValueKind::Nil, None).expect("nil"), Value::Nil);
        assert!(matches!(
            parse_cli_value(ValueKind::Timestamp, Some("2024-01-02T03:04:05Z")),
            Ok(Value::Timestamp(_))
        ));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            parse_cli_value(ValueKind::Uint, Some("-1")),
            Err(CacheError::InvalidValueType(_))
        ));
        assert!(matches!(
            parse_cli_value(ValueKind::Int, None),
            Err(CacheError::InvalidValueType(_))
        ));
    }

    #[test]
    fn renders_edges_under_their_tail() {
        let mut graph: Graph<String, Value> = Graph::new();
        graph.insert_edge("a".to_string(), "b".to_string(), 2.0);
        let text = render_graph(&graph);
        assert!(text.starts_with("2 vertices, 1 edges"));
        assert!(text.contains("    -> b (2)"));
    }

    #[test]
    fn reads_load_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"vertices":[{{"key":"a","value":{{"type":"int","value":1}}}}],"edges":[{{"tail":"a","head":"b","weight":1.0,"ttl_seconds":5}}]}}"#
        )
        .expect("write");

        let load = read_load_file(file.path()).expect("load");
        assert_eq!(load.vertices.len(), 1);
        assert_eq!(load.edges[0].ttl_seconds, Some(5));
    }

    #[test]
    fn load_rejects_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            read_load_file(dir.path()),
            Err(CacheError::IoError(_))
        ));
    }
}
