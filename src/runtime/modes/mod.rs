//! Mode routing
//!
//! This module provides unified entry points for different execution modes:
//! - Server mode (HTTP server)
//! - CLI mode (one-shot lookups, sample config)

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::{configure_routes, run_server};

#[cfg(feature = "cli")]
pub use cli::{init_cli_logging, print_sample_config, run_lookup};
