use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::geoip::{DEFAULT_RATE_LIMIT_TIMEFRAME, ProviderKind, ProviderSettings};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Prefix for environment overrides, e.g. `GEO__PROVIDERS__IPSTACK__TOKEN`
pub const ENV_PREFIX: &str = "GEO";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量、请求超时
/// - logging: 日志配置
/// - providers: 上游 GeoIP provider 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：GEO，分隔符：__
    /// 示例：GEO__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// Same as [`StaticConfig::load`] but surfaces the error.
    pub fn try_load(path: &str) -> Result<Self, config::ConfigError> {
        use config::{Config, Environment, File};

        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<StaticConfig>()
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self {
            providers: ProvidersConfig {
                ipstack: Some(ProviderConfig::for_kind(ProviderKind::Ipstack)),
                ipinfo: Some(ProviderConfig::for_kind(ProviderKind::Ipinfo)),
                ..ProvidersConfig::default()
            },
            ..Self::default()
        };
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// Whole-request deadline; unfinished requests answer 408
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 上游 provider 配置
///
/// 某个 provider 的表存在即启用；`order` 决定故障切换顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_provider_order")]
    pub order: Vec<ProviderKind>,
    /// Socket-level timeout for each upstream call
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default)]
    pub ipstack: Option<ProviderConfig>,
    #[serde(default)]
    pub ipinfo: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// Configured providers, in failover order.
    pub fn enabled(&self) -> Vec<(ProviderKind, &ProviderConfig)> {
        let mut seen = Vec::new();
        self.order
            .iter()
            .filter(|kind| {
                if seen.contains(*kind) {
                    return false;
                }
                seen.push(**kind);
                true
            })
            .filter_map(|kind| self.get(*kind).map(|cfg| (*kind, cfg)))
            .collect()
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::Ipstack => self.ipstack.as_ref(),
            ProviderKind::Ipinfo => self.ipinfo.as_ref(),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// 单个 provider 配置
///
/// 只给出 token 时，其余字段按 provider 默认值补全。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub rate_limit: Option<u32>,
    #[serde(default)]
    pub rate_limit_timeframe_ms: Option<u64>,
}

impl ProviderConfig {
    /// Provider defaults with an empty token
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            base_url: Some(default_base_url(kind).to_string()),
            token: String::new(),
            rate_limit: Some(default_rate_limit(kind)),
            rate_limit_timeframe_ms: Some(DEFAULT_RATE_LIMIT_TIMEFRAME.as_millis() as u64),
        }
    }

    pub fn settings(&self, kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(kind).to_string()),
            token: self.token.clone(),
            rate_limit: self.rate_limit.unwrap_or_else(|| default_rate_limit(kind)),
            rate_limit_timeframe: self.rate_limit_timeframe_ms.map(Duration::from_millis),
        }
    }
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_provider_order() -> Vec<ProviderKind> {
    vec![ProviderKind::Ipstack, ProviderKind::Ipinfo]
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Ipstack => "http://api.ipstack.com",
        ProviderKind::Ipinfo => "https://api.ipinfo.io/lite",
    }
}

fn default_rate_limit(kind: ProviderKind) -> u32 {
    match kind {
        ProviderKind::Ipstack => 100,
        ProviderKind::Ipinfo => 1000,
    }
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            order: default_provider_order(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            ipstack: None,
            ipinfo: None,
        }
    }
}
