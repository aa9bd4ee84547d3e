use std::fmt;

/// Message returned when a provider's call budget is exhausted.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limited";

/// Message returned when the provider answered but carried no country.
pub const COUNTRY_NOT_FOUND_MESSAGE: &str = "Country not found for this IP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// 上游返回非 2xx
    Transport { status: u16, message: String },
    /// 上游 2xx 响应体内声明了错误
    Payload { status: u16, message: String },
    Extraction(String),
    RateLimited,
    Validation(String),
    /// 网络或响应体解析失败，没有 HTTP 状态
    Upstream(String),
    Timeout(String),
    NotFound(String),
    Internal(String),
}

impl GeoError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoError::Transport { .. } => "E001",
            GeoError::Payload { .. } => "E002",
            GeoError::Extraction(_) => "E003",
            GeoError::RateLimited => "E004",
            GeoError::Validation(_) => "E005",
            GeoError::Upstream(_) => "E006",
            GeoError::Timeout(_) => "E007",
            GeoError::NotFound(_) => "E008",
            GeoError::Internal(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoError::Transport { .. } => "Transport Error",
            GeoError::Payload { .. } => "Provider Payload Error",
            GeoError::Extraction(_) => "Extraction Error",
            GeoError::RateLimited => "Rate Limit Error",
            GeoError::Validation(_) => "Validation Error",
            GeoError::Upstream(_) => "Upstream Error",
            GeoError::Timeout(_) => "Timeout Error",
            GeoError::NotFound(_) => "Resource Not Found",
            GeoError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeoError::Transport { message, .. } => message,
            GeoError::Payload { message, .. } => message,
            GeoError::Extraction(msg) => msg,
            GeoError::RateLimited => RATE_LIMITED_MESSAGE,
            GeoError::Validation(msg) => msg,
            GeoError::Upstream(msg) => msg,
            GeoError::Timeout(msg) => msg,
            GeoError::NotFound(msg) => msg,
            GeoError::Internal(msg) => msg,
        }
    }

    /// HTTP status carried by the error, if any.
    ///
    /// `None` marks failures that never produced a status (network, body
    /// decoding, configuration); those are logged before being enveloped.
    pub fn status(&self) -> Option<u16> {
        match self {
            GeoError::Transport { status, .. } => Some(*status),
            GeoError::Payload { status, .. } => Some(*status),
            GeoError::Extraction(_) => Some(400),
            GeoError::RateLimited => Some(429),
            GeoError::Validation(_) => None,
            GeoError::Upstream(_) => None,
            GeoError::Timeout(_) => Some(408),
            GeoError::NotFound(_) => Some(404),
            GeoError::Internal(_) => Some(500),
        }
    }

    /// Whether the failure is unexpected and must reach the error log.
    pub fn should_log(&self) -> bool {
        self.status().is_none_or(|status| status >= 500)
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoError {}

// 便捷的构造函数
impl GeoError {
    pub fn transport<T: Into<String>>(status: u16, msg: T) -> Self {
        GeoError::Transport {
            status,
            message: msg.into(),
        }
    }

    pub fn payload<T: Into<String>>(status: u16, msg: T) -> Self {
        GeoError::Payload {
            status,
            message: msg.into(),
        }
    }

    pub fn country_not_found() -> Self {
        GeoError::Extraction(COUNTRY_NOT_FOUND_MESSAGE.to_string())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        GeoError::Validation(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        GeoError::Upstream(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        GeoError::Timeout(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GeoError::NotFound(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        GeoError::Internal(msg.into())
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Upstream(format!("invalid JSON from provider: {}", err))
    }
}

impl From<url::ParseError> for GeoError {
    fn from(err: url::ParseError) -> Self {
        GeoError::Validation(format!("invalid base URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;
