use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use crate::api::response::Envelope;
use crate::services::ClientOrchestrator;

pub struct CountryService;

impl CountryService {
    /// `GET /countries/{ip}`
    ///
    /// Status line mirrors `meta.status`; the body is the full envelope.
    pub async fn get_country(
        path: web::Path<String>,
        orchestrator: web::Data<Arc<ClientOrchestrator>>,
    ) -> impl Responder {
        let ip = path.into_inner();
        let client = orchestrator.current_client();
        trace!("Resolving {} via {}", ip, client.name());

        let envelope = client.get_country(&ip).await;
        envelope_response(&envelope)
    }
}

/// Render an envelope with its own status code.
pub fn envelope_response(envelope: &Envelope) -> HttpResponse {
    let status =
        StatusCode::from_u16(envelope.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(envelope)
}

/// Country 路由配置
pub fn country_routes() -> actix_web::Scope {
    web::scope("/countries").route("/{ip}", web::get().to(CountryService::get_country))
}
