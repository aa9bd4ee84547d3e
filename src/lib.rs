//! geocountry - IP to country resolution across rate-limited GeoIP providers
//!
//! Each upstream provider is wrapped in a client that caches answers and
//! tracks its own call budget; an orchestrator fails over to the next
//! provider (carrying the cache along) when the active one runs out.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line lookups and sample config output
//!
//! # Architecture
//! - `services`: Provider clients, provider strategies and the orchestrator
//! - `api`: Response envelope, HTTP routes and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod system;
