//! Catch-all responses: unmatched routes and unhandled failures.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Responder};
use tracing::{error, trace};

use super::country::envelope_response;
use crate::api::response::Envelope;

pub const NOT_FOUND_MESSAGE: &str = "404 Not Found";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Default service for any route that matched nothing.
pub async fn not_found() -> impl Responder {
    trace!("No route matched");
    envelope_response(&Envelope::error(404, NOT_FOUND_MESSAGE))
}

/// Replace any 500 body with the error envelope.
pub fn render_internal_error<B: MessageBody + 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    error!(
        path = res.request().path(),
        "Unhandled failure: {:?}",
        res.response().error()
    );

    let (req, _) = res.into_parts();
    let response: HttpResponse = envelope_response(&Envelope::error(500, INTERNAL_ERROR_MESSAGE));
    let res = ServiceResponse::new(req, response).map_into_right_body();

    Ok(ErrorHandlerResponse::Response(res))
}
