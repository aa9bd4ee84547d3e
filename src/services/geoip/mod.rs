//! GeoIP 服务模块
//!
//! 通过多个有限流的外部 API 查询 IP 所属国家：
//! - ipstack（query 参数携带 token）
//! - ipinfo（Bearer token）
//!
//! 当前 provider 被限流时自动切换，并迁移已缓存的结果。

mod client;
mod clock;
mod ipinfo;
mod ipstack;
mod orchestrator;
mod provider;
mod transport;

pub use client::{DEFAULT_RATE_LIMIT_TIMEFRAME, ProviderClient, ProviderSettings};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ipinfo::IpinfoStrategy;
pub use ipstack::IpstackStrategy;
pub use orchestrator::{ClientOrchestrator, ProviderStatus};
pub use provider::{ProviderKind, ProviderRequest, ProviderStrategy, REDACTED};
pub use transport::{FetchResponse, HttpFetch, UreqTransport};
