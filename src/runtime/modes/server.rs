//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_web::{
    App, HttpServer,
    http::StatusCode,
    middleware::{Compress, DefaultHeaders, ErrorHandlers},
    web,
};
use anyhow::Result;
use std::time::Duration;
use tracing::{error, warn};

use crate::api::middleware::RequestTimeout;
use crate::api::services::{
    AppStartTime, country_routes, health_routes, not_found, render_internal_error,
};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Register every route of the service.
///
/// Middleware and the default (404) service are attached by the caller.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_routes()).service(country_routes());
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Builds the provider clients and orchestrator
/// 3. Configures and starts the HTTP server
/// 4. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_startup(config).map_err(|e| {
        error!("Server startup failed: {:#}", e);
        e
    })?;
    let orchestrator = startup.orchestrator.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);
    warn!("Using {} CPU cores for the server", cpu_count);

    let app_orchestrator = orchestrator.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, render_internal_error))
            .wrap(RequestTimeout::new(request_timeout))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::Data::new(app_orchestrator.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(configure_routes)
            .default_service(web::to(not_found))
    })
    .keep_alive(Duration::from_secs(30))
    .disable_signals()
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();

    let handle = server.handle();
    tokio::spawn(async move {
        lifetime::shutdown::listen_for_shutdown().await;
        handle.stop(true).await;
    });

    server.await?;

    lifetime::shutdown::log_final_status(&orchestrator);
    warn!("Graceful shutdown: server stopped");
    Ok(())
}
