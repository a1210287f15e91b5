//! # Lantern
//!
//! Server side of the Lantern graph cache: the HTTP API over
//! `lantern-core`, layered configuration, and the CLI.
//!
//! Exposed as a library so integration tests can drive the router and the
//! command implementations directly.

pub mod api;
pub mod cli;
pub mod config;
