pub mod country;
pub mod fallback;
pub mod health;

pub use country::{CountryService, country_routes, envelope_response};
pub use fallback::{not_found, render_internal_error};
pub use health::{AppStartTime, HealthService, health_routes};
