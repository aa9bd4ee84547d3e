//! Shared fakes for integration tests

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use geocountry::errors::{GeoError, Result};
use geocountry::services::geoip::{
    FetchResponse, HttpFetch, ManualClock, ProviderClient, ProviderKind, ProviderRequest,
    ProviderSettings,
};

pub const START_MILLIS: i64 = 1_700_000_000_000;
pub const HOUR_MS: i64 = 3_600_000;

type Responder = dyn Fn(&ProviderRequest) -> Result<FetchResponse> + Send + Sync;

/// Transport answering from a closure and recording every request.
pub struct FakeTransport {
    responder: Box<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl FakeTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ProviderRequest) -> Result<FetchResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Same as [`FakeTransport::new`] but every call sleeps first.
    pub fn slow<F>(delay: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&ProviderRequest) -> Result<FetchResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answers 200 with `body`.
    pub fn json(body: Value) -> Arc<Self> {
        Self::new(move |_| Ok(ok_json(&body)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for FakeTransport {
    async fn fetch(&self, request: &ProviderRequest) -> Result<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }
}

pub fn ok_json(body: &Value) -> FetchResponse {
    FetchResponse {
        status: 200,
        status_text: "OK".into(),
        body: body.to_string(),
    }
}

pub fn status(code: u16, text: &str) -> FetchResponse {
    FetchResponse {
        status: code,
        status_text: text.into(),
        body: String::new(),
    }
}

pub fn network_error() -> GeoError {
    GeoError::upstream("request failed: connection refused")
}

/// ipstack-style answer for whatever IP was requested: the country is
/// derived from the first octet so distinct IPs are distinguishable.
pub fn ipstack_echo() -> Arc<FakeTransport> {
    FakeTransport::new(|req| {
        let ip = req
            .url
            .split('/')
            .next_back()
            .and_then(|tail| tail.split('?').next())
            .unwrap_or_default();
        let first = ip.split('.').next().unwrap_or_default();
        Ok(ok_json(&json!({ "ip": ip, "country_name": format!("Country-{}", first) })))
    })
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(START_MILLIS))
}

pub fn ipstack_client(
    rate_limit: u32,
    transport: Arc<FakeTransport>,
    clock: Arc<ManualClock>,
) -> ProviderClient {
    ProviderClient::new(
        ProviderSettings::new("http://api.ipstack.com", "test-key", rate_limit)
            .with_timeframe(Duration::from_millis(HOUR_MS as u64)),
        ProviderKind::Ipstack.strategy(),
        transport,
        clock,
    )
    .expect("valid settings")
}

pub fn ipinfo_client(
    rate_limit: u32,
    transport: Arc<FakeTransport>,
    clock: Arc<ManualClock>,
) -> ProviderClient {
    ProviderClient::new(
        ProviderSettings::new("https://ipinfo.io", "test-token", rate_limit)
            .with_timeframe(Duration::from_millis(HOUR_MS as u64)),
        ProviderKind::Ipinfo.strategy(),
        transport,
        clock,
    )
    .expect("valid settings")
}

/// In-memory log sink for a test-local subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
