//! Request timeout middleware
//!
//! Bounds the whole request. A handler that has not answered within the
//! deadline is dropped and the client receives a 408 error envelope.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::api::response::Envelope;
use crate::api::services::envelope_response;

/// Deadline applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const REQUEST_TIMEOUT_MESSAGE: &str = "Request timeout";

/// Request timeout middleware factory
#[derive(Clone)]
pub struct RequestTimeout {
    timeout: Duration,
}

impl RequestTimeout {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTimeout
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimeoutService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimeoutService {
            service: Rc::new(service),
            timeout: self.timeout,
        }))
    }
}

pub struct RequestTimeoutService<S> {
    service: Rc<S>,
    timeout: Duration,
}

impl<S, B> Service<ServiceRequest> for RequestTimeoutService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let timeout = self.timeout;
        let start = Instant::now();
        // Keep a handle on the request so a response can still be built
        // after the inner future is dropped.
        let http_req = req.request().clone();

        Box::pin(async move {
            match tokio::time::timeout(timeout, srv.call(req)).await {
                Ok(result) => {
                    debug!(
                        "{} {} answered in {:?}",
                        http_req.method(),
                        http_req.path(),
                        start.elapsed()
                    );
                    result.map(ServiceResponse::map_into_left_body)
                }
                Err(_) => {
                    warn!(
                        "{} {} timed out after {:?}",
                        http_req.method(),
                        http_req.path(),
                        timeout
                    );
                    let response =
                        envelope_response(&Envelope::error(408, REQUEST_TIMEOUT_MESSAGE));
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
            }
        })
    }
}
