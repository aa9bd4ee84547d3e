//! Client Orchestrator
//!
//! Keeps an ordered list of provider clients and hands out the one that
//! still has budget. When the active client runs dry the first client with
//! budget takes over and inherits the cached lookups.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use super::client::ProviderClient;
use crate::errors::{GeoError, Result};

/// Point-in-time view of one provider, as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: &'static str,
    pub active: bool,
    pub rate_limit: u32,
    pub rate_limit_count: u32,
    pub rate_limited: bool,
    pub cache_size: usize,
}

#[derive(Debug)]
pub struct ClientOrchestrator {
    clients: Vec<Arc<ProviderClient>>,
    active: Mutex<usize>,
}

impl ClientOrchestrator {
    pub fn new(clients: Vec<Arc<ProviderClient>>) -> Result<Self> {
        if clients.is_empty() {
            return Err(GeoError::validation(
                "at least one GeoIP provider must be configured",
            ));
        }

        Ok(Self {
            clients,
            active: Mutex::new(0),
        })
    }

    /// The client requests should go to right now.
    ///
    /// Re-evaluated on every call: windows expire and other callers spend
    /// budget between accesses.
    pub fn current_client(&self) -> Arc<ProviderClient> {
        let mut active = self.active.lock();
        let current = &self.clients[*active];

        if !current.is_rate_limited() {
            return Arc::clone(current);
        }

        let Some(next) = self.clients.iter().position(|c| !c.is_rate_limited()) else {
            warn!(
                "GeoIP: all {} providers are rate limited, staying on {}",
                self.clients.len(),
                current.name()
            );
            return Arc::clone(current);
        };

        let candidate = &self.clients[next];
        candidate.transfer_cache(current);
        info!(
            "GeoIP: {} is rate limited, switching to {} ({} cached entries)",
            current.name(),
            candidate.name(),
            candidate.cache_len()
        );

        *active = next;
        Arc::clone(candidate)
    }

    pub fn clients(&self) -> &[Arc<ProviderClient>] {
        &self.clients
    }

    pub fn active_index(&self) -> usize {
        *self.active.lock()
    }

    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        let active = self.active_index();
        self.clients
            .iter()
            .enumerate()
            .map(|(i, c)| ProviderStatus {
                name: c.name(),
                active: i == active,
                rate_limit: c.rate_limit(),
                rate_limit_count: c.rate_limit_count(),
                rate_limited: c.is_rate_limited(),
                cache_size: c.cache_len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_client_list_is_rejected() {
        let err = ClientOrchestrator::new(Vec::new()).unwrap_err();
        assert!(matches!(err, GeoError::Validation(_)));
    }
}
