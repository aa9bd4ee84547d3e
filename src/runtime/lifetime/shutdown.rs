use tokio::signal;
use tracing::{info, warn};

use crate::services::ClientOrchestrator;

/// Wait for Ctrl+C.
pub async fn listen_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// Log what each provider consumed before the in-memory state is dropped.
pub fn log_final_status(orchestrator: &ClientOrchestrator) {
    for status in orchestrator.provider_status() {
        info!(
            "GeoIP: {} used {}/{} calls, {} cached entries{}",
            status.name,
            status.rate_limit_count,
            status.rate_limit,
            status.cache_size,
            if status.active { " (active)" } else { "" }
        );
    }
}
