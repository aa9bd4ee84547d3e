use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

use crate::services::ClientOrchestrator;
use crate::services::geoip::ProviderStatus;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    /// Every provider rate limited: lookups will answer 429 until a window resets
    pub degraded: bool,
    pub providers: Vec<ProviderStatus>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        orchestrator: web::Data<Arc<ClientOrchestrator>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let providers = orchestrator.provider_status();
        let degraded = providers.iter().all(|p| p.rate_limited);
        let now = chrono::Utc::now();

        HttpResponse::Ok().json(HealthResponse {
            status: if degraded { "degraded" } else { "healthy" },
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            degraded,
            providers,
        })
    }

    // 活跃性检查，检查基本服务可用性
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
