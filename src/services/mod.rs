//! Service layer for business logic
//!
//! This module provides the lookup logic shared between the HTTP API and
//! the CLI.

pub mod geoip;

pub use geoip::{ClientOrchestrator, ProviderClient, ProviderKind, ProviderSettings};
