//! Configuration loading tests

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use geocountry::config::StaticConfig;
use geocountry::runtime::lifetime::startup::build_orchestrator;
use geocountry::services::ProviderKind;
use geocountry::services::geoip::UreqTransport;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_providers_from_toml() {
    let file = write_config(
        r#"
[server]
port = 9090
request_timeout_secs = 15

[providers]
order = ["ipinfo", "ipstack"]
upstream_timeout_secs = 3

[providers.ipstack]
token = "stack-key"
rate_limit = 5
rate_limit_timeframe_ms = 60000

[providers.ipinfo]
token = "info-token"
base_url = "https://ipinfo.example.test"
"#,
    );

    let config = StaticConfig::try_load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.request_timeout_secs, 15);
    assert_eq!(config.providers.upstream_timeout(), Duration::from_secs(3));

    let enabled = config.providers.enabled();
    assert_eq!(enabled[0].0, ProviderKind::Ipinfo);
    assert_eq!(enabled[1].0, ProviderKind::Ipstack);

    let ipstack = enabled[1].1.settings(ProviderKind::Ipstack);
    assert_eq!(ipstack.base_url, "http://api.ipstack.com");
    assert_eq!(ipstack.rate_limit, 5);
    assert_eq!(ipstack.rate_limit_timeframe, Some(Duration::from_secs(60)));

    let ipinfo = enabled[0].1.settings(ProviderKind::Ipinfo);
    assert_eq!(ipinfo.base_url, "https://ipinfo.example.test");
    assert_eq!(ipinfo.rate_limit, 1000);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = StaticConfig::load(path.to_str().unwrap());
    assert_eq!(config.server.port, 8080);
    assert!(config.providers.enabled().is_empty());
}

#[test]
fn test_unknown_provider_in_order_is_rejected() {
    let file = write_config(
        r#"
[providers]
order = ["maxmind"]
"#,
    );

    assert!(StaticConfig::try_load(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_loaded_config_builds_orchestrator() {
    let file = write_config(
        r#"
[providers.ipstack]
token = "stack-key"
rate_limit = 2
"#,
    );

    let config = StaticConfig::try_load(file.path().to_str().unwrap()).unwrap();
    let transport = std::sync::Arc::new(UreqTransport::new(config.providers.upstream_timeout()));
    let orchestrator = build_orchestrator(&config.providers, transport).unwrap();

    assert_eq!(orchestrator.clients().len(), 1);
    let client = orchestrator.current_client();
    assert_eq!(client.name(), "ipstack");
    assert_eq!(client.rate_limit(), 2);
    assert_eq!(client.rate_limit_timeframe(), Duration::from_secs(3600));
}

#[test]
fn test_sample_config_can_be_saved_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let sample: StaticConfig = toml::from_str(&StaticConfig::generate_sample_config()).unwrap();
    sample.save_to_file(&path).unwrap();

    let reloaded = StaticConfig::try_load(path.to_str().unwrap()).unwrap();
    let kinds: Vec<_> = reloaded
        .providers
        .enabled()
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
    assert_eq!(kinds, vec![ProviderKind::Ipstack, ProviderKind::Ipinfo]);
}
