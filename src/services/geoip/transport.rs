//! 上游 HTTP 传输层
//!
//! `HttpFetch` 是 Provider Client 唯一依赖的网络能力；
//! 生产实现基于 ureq（同步），在 spawn_blocking 中执行。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::ProviderRequest;
use crate::errors::{GeoError, Result};

/// Raw upstream answer, before any provider-specific interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Issue a GET for `request`. Non-2xx answers are returned, not raised;
    /// only failures with no HTTP status surface as `Err`.
    async fn fetch(&self, request: &ProviderRequest) -> Result<FetchResponse>;
}

/// ureq 实现（Agent 是 Send + Sync，clone 只增加引用计数）
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    fn fetch_sync(agent: &Agent, request: &ProviderRequest) -> Result<FetchResponse> {
        let mut builder = agent.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut resp = builder.call().map_err(|e| {
            warn!("GeoIP request to \"{}\" failed: {}", request.display_url, e);
            GeoError::upstream(format!("request failed: {}", e))
        })?;

        let status = resp.status();
        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| GeoError::upstream(format!("failed to read response body: {}", e)))?;

        trace!(
            "GeoIP response from \"{}\": {} ({} bytes)",
            request.display_url,
            status,
            body.len()
        );

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait]
impl HttpFetch for UreqTransport {
    async fn fetch(&self, request: &ProviderRequest) -> Result<FetchResponse> {
        let agent = self.agent.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || Self::fetch_sync(&agent, &request))
            .await
            .map_err(|e| GeoError::internal(format!("GeoIP spawn_blocking failed: {}", e)))?
    }
}
