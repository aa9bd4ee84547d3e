//! GeoIP Provider 抽象层
//!
//! 每个上游服务只在三处不同：请求构造、错误响应识别、国家字段提取。
//! 这三点由 `ProviderStrategy` 表达；缓存、限流、响应封装都在
//! `ProviderClient` 中统一实现。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use url::Url;

use super::ipinfo::IpinfoStrategy;
use super::ipstack::IpstackStrategy;
use crate::errors::{GeoError, Result};

/// Placeholder substituted for credentials in URLs that leave the process.
pub const REDACTED: &str = "***";

/// Supported upstream providers
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    /// Token as `access_key` query parameter
    Ipstack,
    /// Token as bearer header
    Ipinfo,
}

impl ProviderKind {
    pub fn strategy(self) -> Box<dyn ProviderStrategy> {
        match self {
            ProviderKind::Ipstack => Box::new(IpstackStrategy),
            ProviderKind::Ipinfo => Box::new(IpinfoStrategy),
        }
    }
}

/// A fully built upstream GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub url: String,
    /// `url` with credentials masked, safe for envelopes and logs
    pub display_url: String,
    pub headers: Vec<(String, String)>,
}

impl ProviderRequest {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            display_url: url.clone(),
            url,
            headers: Vec::new(),
        }
    }

    pub fn with_display_url(mut self, display_url: impl Into<String>) -> Self {
        self.display_url = display_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

pub trait ProviderStrategy: Send + Sync {
    /// Provider 名称（用于日志）
    fn name(&self) -> &'static str;

    /// Build the request for `ip` against `base_url`, authenticated by `token`.
    fn build_request(&self, base_url: &str, token: &str, ip: &str) -> Result<ProviderRequest>;

    /// Reject a 2xx payload that announces an error.
    fn validate_payload(&self, payload: &Value) -> Result<()>;

    /// Pull the country name out of a validated payload.
    fn extract_country_name(&self, payload: &Value) -> Option<String>;
}

/// `base_url` with `ip` appended as one percent-encoded path segment.
pub(crate) fn endpoint(base_url: &str, ip: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| GeoError::validation(format!("base URL cannot carry a path: {}", base_url)))?
        .pop_if_empty()
        .push(ip);
    Ok(url)
}

/// Non-empty string field of a JSON object.
pub(crate) fn non_empty_str(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
