//! Provider Client
//!
//! One instance per upstream provider. Owns the IP → country cache and the
//! rate-limit window; the provider-specific parts come from a
//! [`ProviderStrategy`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, trace};
use url::Url;

use super::clock::{Clock, SystemClock};
use super::provider::{ProviderKind, ProviderRequest, ProviderStrategy};
use super::transport::HttpFetch;
use crate::api::response::{Envelope, MetaOptions, Outcome, format_result};
use crate::errors::{GeoError, Result};

/// Window length used when a provider does not configure one (1 hour).
pub const DEFAULT_RATE_LIMIT_TIMEFRAME: Duration = Duration::from_secs(60 * 60);

/// Construction parameters for a [`ProviderClient`].
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub token: String,
    pub rate_limit: u32,
    pub rate_limit_timeframe: Option<Duration>,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, rate_limit: u32) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            rate_limit,
            rate_limit_timeframe: None,
        }
    }

    pub fn with_timeframe(mut self, timeframe: Duration) -> Self {
        self.rate_limit_timeframe = Some(timeframe);
        self
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GeoError::validation(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.token.trim().is_empty() {
            return Err(GeoError::validation("token must not be empty"));
        }
        if self.rate_limit == 0 {
            return Err(GeoError::validation("rate limit must be greater than 0"));
        }
        if self.rate_limit_timeframe.is_some_and(|t| t.is_zero()) {
            return Err(GeoError::validation(
                "rate limit timeframe must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Counters and cache, only ever touched under the client's lock.
#[derive(Debug, Default)]
struct ClientState {
    rate_limit_count: u32,
    rate_limit_expiry: Option<i64>,
    cache: HashMap<String, String>,
}

impl ClientState {
    fn window_expired(&self, now: i64) -> bool {
        self.rate_limit_expiry.is_none_or(|expiry| now > expiry)
    }
}

pub struct ProviderClient {
    base_url: String,
    token: String,
    rate_limit: u32,
    rate_limit_timeframe: Duration,
    strategy: Box<dyn ProviderStrategy>,
    transport: Arc<dyn HttpFetch>,
    clock: Arc<dyn Clock>,
    state: Mutex<ClientState>,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("name", &self.name())
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .field("rate_limit_timeframe", &self.rate_limit_timeframe)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// Build a client. Fails with [`GeoError::Validation`] on bad settings.
    pub fn new(
        settings: ProviderSettings,
        strategy: Box<dyn ProviderStrategy>,
        transport: Arc<dyn HttpFetch>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            base_url: settings.base_url,
            token: settings.token,
            rate_limit: settings.rate_limit,
            rate_limit_timeframe: settings
                .rate_limit_timeframe
                .unwrap_or(DEFAULT_RATE_LIMIT_TIMEFRAME),
            strategy,
            transport,
            clock,
            state: Mutex::new(ClientState::default()),
        })
    }

    /// Client for a known provider kind on the system clock.
    pub fn for_kind(
        kind: ProviderKind,
        settings: ProviderSettings,
        transport: Arc<dyn HttpFetch>,
    ) -> Result<Self> {
        Self::new(settings, kind.strategy(), transport, Arc::new(SystemClock))
    }

    /// Resolve the country of `ip`.
    ///
    /// Never fails: every problem is reported as an error envelope.
    pub async fn get_country(&self, ip: &str) -> Envelope {
        let request = match self.strategy.build_request(&self.base_url, &self.token, ip) {
            Ok(request) => request,
            Err(e) => return self.failure(&e, None),
        };

        if let Some(name) = self.cached_country(ip) {
            trace!("GeoIP cache hit for {} on {}", ip, self.name());
            return format_result(Outcome::country(name), self.meta(None, true));
        }

        match self.resolve(ip, &request).await {
            Ok(name) => {
                self.state.lock().cache.insert(ip.to_string(), name.clone());
                format_result(
                    Outcome::country(name),
                    self.meta(Some(request.display_url), false),
                )
            }
            Err(e) => self.failure(&e, Some(request.display_url)),
        }
    }

    /// Rate-limit gate, upstream call, validation and extraction.
    async fn resolve(&self, ip: &str, request: &ProviderRequest) -> Result<String> {
        self.acquire_budget()?;

        debug!("GeoIP cache miss for {}, calling {}", ip, request.display_url);
        let response = self.transport.fetch(request).await?;

        if !response.ok() {
            return Err(GeoError::transport(
                response.status,
                format!("{} {}", response.status, response.status_text),
            ));
        }

        let payload = response.json()?;
        self.strategy.validate_payload(&payload)?;

        self.strategy
            .extract_country_name(&payload)
            .ok_or_else(GeoError::country_not_found)
    }

    /// Reset an expired window, then take one unit of budget or fail with 429.
    fn acquire_budget(&self) -> Result<()> {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();

        if state.window_expired(now) {
            state.rate_limit_count = 0;
            state.rate_limit_expiry = Some(now.saturating_add(self.timeframe_millis()));
        }

        if state.rate_limit_count >= self.rate_limit {
            return Err(GeoError::RateLimited);
        }

        state.rate_limit_count += 1;
        Ok(())
    }

    fn failure(&self, err: &GeoError, api_url: Option<String>) -> Envelope {
        if err.should_log() {
            error!(
                provider = self.name(),
                api_url = api_url.as_deref().unwrap_or_default(),
                "GeoIP lookup failed: {}",
                err
            );
        }
        format_result(Outcome::from(err), self.meta(api_url, false))
    }

    fn meta(&self, api_url: Option<String>, cache: bool) -> MetaOptions {
        MetaOptions {
            api_url,
            cache,
            rate_limit: Some(self.rate_limit),
            rate_limit_count: Some(self.rate_limit_count()),
        }
    }

    /// Merge `other`'s cache into this one. Entries already held here win.
    pub fn transfer_cache(&self, other: &ProviderClient) {
        if std::ptr::eq(self, other) {
            return;
        }

        let incoming = other.cache_snapshot();
        let mut state = self.state.lock();
        for (ip, name) in incoming {
            state.cache.entry(ip).or_insert(name);
        }
    }

    /// True while the current window is open and its budget is spent.
    pub fn is_rate_limited(&self) -> bool {
        let now = self.clock.now_millis();
        let state = self.state.lock();
        !state.window_expired(now) && state.rate_limit_count >= self.rate_limit
    }

    fn timeframe_millis(&self) -> i64 {
        i64::try_from(self.rate_limit_timeframe.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    pub fn rate_limit_timeframe(&self) -> Duration {
        self.rate_limit_timeframe
    }

    pub fn rate_limit_count(&self) -> u32 {
        self.state.lock().rate_limit_count
    }

    pub fn rate_limit_expiry(&self) -> Option<i64> {
        self.state.lock().rate_limit_expiry
    }

    pub fn cached_country(&self, ip: &str) -> Option<String> {
        self.state.lock().cache.get(ip).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.state.lock().cache.len()
    }

    pub fn cache_snapshot(&self) -> HashMap<String, String> {
        self.state.lock().cache.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geoip::clock::ManualClock;
    use crate::services::geoip::ipstack::IpstackStrategy;
    use crate::services::geoip::transport::FetchResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpFetch for CountingTransport {
        async fn fetch(&self, _request: &ProviderRequest) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse {
                status: 200,
                status_text: "OK".into(),
                body: r#"{"country_name":"Germany"}"#.into(),
            })
        }
    }

    fn client(rate_limit: u32) -> (ProviderClient, Arc<CountingTransport>, Arc<ManualClock>) {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new(1_000_000));
        let client = ProviderClient::new(
            ProviderSettings::new("http://api.ipstack.com", "key", rate_limit)
                .with_timeframe(Duration::from_secs(60)),
            Box::new(IpstackStrategy),
            transport.clone(),
            clock.clone(),
        )
        .unwrap();
        (client, transport, clock)
    }

    #[test]
    fn test_settings_validation() {
        let transport: Arc<dyn HttpFetch> = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let build = |settings: ProviderSettings| {
            ProviderClient::for_kind(ProviderKind::Ipstack, settings, transport.clone())
        };

        assert!(build(ProviderSettings::new("http://api.ipstack.com", "k", 1)).is_ok());
        assert!(matches!(
            build(ProviderSettings::new("api.ipstack.com", "k", 1)),
            Err(GeoError::Validation(_))
        ));
        assert!(build(ProviderSettings::new("ftp://api.ipstack.com", "k", 1)).is_err());
        assert!(build(ProviderSettings::new("http://api.ipstack.com", " ", 1)).is_err());
        assert!(build(ProviderSettings::new("http://api.ipstack.com", "k", 0)).is_err());
        assert!(
            build(
                ProviderSettings::new("http://api.ipstack.com", "k", 1)
                    .with_timeframe(Duration::ZERO)
            )
            .is_err()
        );
    }

    #[test]
    fn test_default_timeframe_is_one_hour() {
        let transport: Arc<dyn HttpFetch> = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let client = ProviderClient::for_kind(
            ProviderKind::Ipinfo,
            ProviderSettings::new("https://ipinfo.io", "k", 5),
            transport,
        )
        .unwrap();
        assert_eq!(client.rate_limit_timeframe(), Duration::from_secs(3600));
        assert_eq!(client.name(), "ipinfo");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream_and_budget() {
        let (client, transport, _clock) = client(5);

        let first = client.get_country("9.9.9.9").await;
        assert_eq!(first.meta().cache, Some(false));
        assert_eq!(client.rate_limit_count(), 1);

        let second = client.get_country("9.9.9.9").await;
        assert_eq!(second.country_name(), Some("Germany"));
        assert_eq!(second.meta().cache, Some(true));
        assert_eq!(second.meta().api_url, None);
        assert_eq!(second.meta().rate_limit_count, Some(1));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_window_is_lazy_and_resets_after_expiry() {
        let (client, _transport, clock) = client(1);
        assert_eq!(client.rate_limit_expiry(), None);
        assert!(!client.is_rate_limited());

        client.get_country("1.1.1.1").await;
        assert_eq!(client.rate_limit_expiry(), Some(1_000_000 + 60_000));
        assert!(client.is_rate_limited());

        // 窗口边界：now == expiry 仍在窗口内
        clock.advance(60_000);
        assert!(client.is_rate_limited());

        clock.advance(1);
        assert!(!client.is_rate_limited());
        // 只读查询不重置计数
        assert_eq!(client.rate_limit_count(), 1);
    }

    #[tokio::test]
    async fn test_transfer_cache_into_self_is_noop() {
        let (client, _transport, _clock) = client(5);
        client.get_country("1.1.1.1").await;
        client.transfer_cache(&client);
        assert_eq!(client.cache_len(), 1);
    }
}
