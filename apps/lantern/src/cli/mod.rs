//! # Lantern CLI Module
//!
//! This module implements the CLI interface for Lantern.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `health` / `status` - Query a running server
//! - `put-vertex`, `get-vertex`, `delete-vertex` - Vertex operations
//! - `add-edge`, `get-edge`, `delete-edge` - Edge operations
//! - `illuminate` - Neighborhood expansion of a seed
//! - `load` - Bulk-load vertices and edges from a JSON file
//!
//! Every command except `server` talks to a running server through
//! `lantern-client`.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use lantern_client::{ClientError, LanternClient};
use lantern_core::{CacheError, Optimization};
use std::path::PathBuf;

pub use commands::*;

/// Server URL when neither `--url` nor `LANTERN_URL` is given.
pub const DEFAULT_URL: &str = "http://127.0.0.1:6380";

// =============================================================================
// ERRORS
// =============================================================================

/// Failure of a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lantern - TTL graph cache
///
/// An in-memory graph whose vertices and edge contributions expire
/// independently, queried by bounded neighborhood expansion.
#[derive(Parser, Debug)]
#[command(name = "lantern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Server URL for client commands [env: LANTERN_URL]
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// API key for client commands [env: LANTERN_API_KEY]
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Wire type of a value given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    Int,
    Uint,
    Float,
    String,
    Bool,
    /// Base64-encoded bytes
    Bytes,
    /// RFC 3339 timestamp
    Timestamp,
    Nil,
}

/// Reduction applied to an illuminated subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OptimizationArg {
    None,
    Mst,
    MaxSt,
    Spt,
    InverseSpt,
}

impl From<OptimizationArg> for Optimization {
    fn from(arg: OptimizationArg) -> Self {
        match arg {
            OptimizationArg::None => Self::None,
            OptimizationArg::Mst => Self::MinimumSpanningTree,
            OptimizationArg::MaxSt => Self::MaximumSpanningTree,
            OptimizationArg::Spt => Self::ShortestPathTree,
            OptimizationArg::InverseSpt => Self::InverseWeightedPathTree,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// TTL for writes without an expiration, in seconds
        #[arg(long)]
        default_ttl: Option<u64>,

        /// Seconds between eviction sweeps
        #[arg(long)]
        sweep_interval: Option<u64>,
    },

    /// Check that the server is up
    Health,

    /// Show store sizes
    Status,

    /// Put a vertex
    PutVertex {
        key: String,

        /// Value, parsed according to --type (omit for nil)
        value: Option<String>,

        /// Value type
        #[arg(short = 't', long = "type", value_enum, default_value = "string")]
        kind: ValueKind,

        /// TTL in seconds (server default if omitted)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Get a live vertex
    GetVertex { key: String },

    /// Delete a vertex
    DeleteVertex { key: String },

    /// Add a contribution to an edge
    AddEdge {
        tail: String,
        head: String,
        weight: f64,

        /// TTL in seconds (server default if omitted)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Get the live weight of an edge
    GetEdge { tail: String, head: String },

    /// Drop every contribution of an edge
    DeleteEdge { tail: String, head: String },

    /// Expand the neighborhood of a seed vertex
    Illuminate {
        seed: String,

        /// Maximum hop count
        #[arg(short, long, default_value = "2")]
        step: usize,

        /// Maximum out-edges followed per vertex
        #[arg(short, long, default_value = "10")]
        k: usize,

        /// Reweight edges with TF-IDF
        #[arg(long)]
        tfidf: bool,

        /// Reduce the result to a tree
        #[arg(short, long, value_enum, default_value = "none")]
        optimization: OptimizationArg,
    },

    /// Bulk-load vertices and edges from a JSON file
    Load {
        /// File holding `{"vertices": [...], "edges": [...]}`
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Cli {
    /// Client for every command except `server`.
    fn client(&self) -> LanternClient {
        let url = self
            .url
            .clone()
            .or_else(|| std::env::var("LANTERN_URL").ok())
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("LANTERN_API_KEY").ok())
            .filter(|k| !k.is_empty());
        LanternClient::new(url, api_key)
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let json_mode = cli.json_mode;
    let client = cli.client();

    match cli.command {
        Some(Commands::Server {
            config,
            host,
            port,
            default_ttl,
            sweep_interval,
        }) => {
            cmd_server(
                config.as_deref(),
                host,
                port,
                default_ttl,
                sweep_interval,
            )
            .await
        }
        Some(Commands::Health) => cmd_health(&client, json_mode).await,
        Some(Commands::Status) | None => cmd_status(&client, json_mode).await,
        Some(Commands::PutVertex {
            key,
            value,
            kind,
            ttl,
        }) => cmd_put_vertex(&client, &key, value.as_deref(), kind, ttl).await,
        Some(Commands::GetVertex { key }) => cmd_get_vertex(&client, json_mode, &key).await,
        Some(Commands::DeleteVertex { key }) => cmd_delete_vertex(&client, &key).await,
        Some(Commands::AddEdge {
            tail,
            head,
            weight,
            ttl,
        }) => cmd_add_edge(&client, &tail, &head, weight, ttl).await,
        Some(Commands::GetEdge { tail, head }) => {
            cmd_get_edge(&client, json_mode, &tail, &head).await
        }
        Some(Commands::DeleteEdge { tail, head }) => cmd_delete_edge(&client, &tail, &head).await,
        Some(Commands::Illuminate {
            seed,
            step,
            k,
            tfidf,
            optimization,
        }) => {
            let query = lantern_core::IlluminateQuery::new(seed, step, k)
                .with_tfidf(tfidf)
                .with_optimization(optimization.into());
            cmd_illuminate(&client, json_mode, &query).await
        }
        Some(Commands::Load { file }) => cmd_load(&client, &file).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_illuminate_flags() {
        let cli = Cli::try_parse_from([
            "lantern",
            "illuminate",
            "a",
            "--step",
            "3",
            "-k",
            "4",
            "--tfidf",
            "--optimization",
            "inverse-spt",
        ])
        .expect("parse");

        match cli.command {
            Some(Commands::Illuminate {
                seed,
                step,
                k,
                tfidf,
                optimization,
            }) => {
                assert_eq!(seed, "a");
                assert_eq!(step, 3);
                assert_eq!(k, 4);
                assert!(tfidf);
                assert_eq!(
                    Optimization::from(optimization),
                    Optimization::InverseWeightedPathTree
                );
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_typed_put() {
        let cli = Cli::try_parse_from(["lantern", "put-vertex", "n", "42", "--type", "int"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::PutVertex {
                kind: ValueKind::Int,
                ..
            })
        ));
    }

    #[test]
    fn explicit_url_wins() {
        let cli =
            Cli::try_parse_from(["lantern", "--url", "http://cache:9000", "status"]).expect("parse");
        assert_eq!(cli.client().base_url(), "http://cache:9000");
    }
}
