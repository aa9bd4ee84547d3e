pub mod timeout;

pub use timeout::{DEFAULT_REQUEST_TIMEOUT, RequestTimeout};
