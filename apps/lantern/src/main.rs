//! # Lantern - TTL Graph Cache
//!
//! The main binary for the Lantern graph cache.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI commands against a running server
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  apps/lantern (THE BINARY)                   │
//! │                                                              │
//! │  ┌─────────────┐        ┌─────────────┐                      │
//! │  │   CLI       │──HTTP─▶│   HTTP API  │                      │
//! │  │  (clap)     │        │   (axum)    │                      │
//! │  └─────────────┘        └──────┬──────┘                      │
//! │   via lantern-client           │                             │
//! │                                ▼                             │
//! │                        ┌───────────────┐   ┌─────────────┐   │
//! │                        │ lantern-core  │◀──│   sweeper   │   │
//! │                        │ (GraphCache)  │   │ (tokio task)│   │
//! │                        └───────────────┘   └─────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! lantern server --host 0.0.0.0 --port 6380 --default-ttl 60
//!
//! # CLI operations
//! lantern add-edge a b 1.0 --ttl 300
//! lantern illuminate a --step 2 -k 5 --optimization mst
//! lantern status
//! ```

use clap::Parser;
use lantern::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LANTERN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LANTERN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lantern=info,lantern_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && matches!(cli.command, Some(cli::Commands::Server { .. })) {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Lantern startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗      █████╗ ███╗   ██╗████████╗███████╗██████╗ ███╗   ██╗
  ██║     ██╔══██╗████╗  ██║╚══██╔══╝██╔════╝██╔══██╗████╗  ██║
  ██║     ███████║██╔██╗ ██║   ██║   █████╗  ██████╔╝██╔██╗ ██║
  ██║     ██╔══██║██║╚██╗██║   ██║   ██╔══╝  ██╔══██╗██║╚██╗██║
  ███████╗██║  ██║██║ ╚████║   ██║   ███████╗██║  ██║██║ ╚████║
  ╚══════╝╚═╝  ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚══════╝╚═╝  ╚═╝╚═╝  ╚═══╝

  Graph Cache v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
