//! Startup wiring
//!
//! Turns the static configuration into the process-scoped lookup state.
//! Nothing here is global: the returned context is handed to the server or
//! CLI explicitly.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{ProvidersConfig, StaticConfig};
use crate::errors::GeoError;
use crate::services::geoip::{HttpFetch, SystemClock, UreqTransport};
use crate::services::{ClientOrchestrator, ProviderClient};

pub struct StartupContext {
    pub orchestrator: Arc<ClientOrchestrator>,
}

/// Build one client per enabled provider, in failover order.
pub fn build_orchestrator(
    providers: &ProvidersConfig,
    transport: Arc<dyn HttpFetch>,
) -> crate::errors::Result<ClientOrchestrator> {
    let clock = Arc::new(SystemClock);

    let clients = providers
        .enabled()
        .into_iter()
        .map(|(kind, cfg)| {
            let client = ProviderClient::new(
                cfg.settings(kind),
                kind.strategy(),
                Arc::clone(&transport),
                clock.clone(),
            )
            .map_err(|e| GeoError::validation(format!("provider {}: {}", kind, e.message())))?;

            info!(
                "GeoIP: {} enabled ({} calls per {:?})",
                client.name(),
                client.rate_limit(),
                client.rate_limit_timeframe()
            );
            Ok(Arc::new(client))
        })
        .collect::<crate::errors::Result<Vec<_>>>()?;

    ClientOrchestrator::new(clients)
}

/// 准备启动上下文（provider 客户端与编排器）
pub fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let transport: Arc<dyn HttpFetch> =
        Arc::new(UreqTransport::new(config.providers.upstream_timeout()));
    let orchestrator = build_orchestrator(&config.providers, transport)
        .context("Failed to configure GeoIP providers")?;

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        orchestrator: Arc::new(orchestrator),
    })
}
