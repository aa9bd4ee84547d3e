//! HTTP boundary: routes, middleware and the response envelope.

pub mod middleware;
pub mod response;
pub mod services;
