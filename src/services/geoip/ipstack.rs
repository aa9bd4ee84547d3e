//! ipstack 风格 Provider
//!
//! `GET {base}/{ip}?access_key={token}`，国家字段为 `country_name`。
//! 错误以 200 返回：`{"success": false, "error": {"code", "type", "info"}}`

use serde_json::Value;

use super::provider::{ProviderRequest, ProviderStrategy, REDACTED, endpoint, non_empty_str};
use crate::errors::{GeoError, Result};

const TOKEN_PARAM: &str = "access_key";
const INVALID_ACCESS_KEY: &str = "invalid_access_key";

#[derive(Debug, Clone, Copy, Default)]
pub struct IpstackStrategy;

impl ProviderStrategy for IpstackStrategy {
    fn name(&self) -> &'static str {
        "ipstack"
    }

    fn build_request(&self, base_url: &str, token: &str, ip: &str) -> Result<ProviderRequest> {
        let mut url = endpoint(base_url, ip)?;
        let mut display = url.clone();

        url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
        display.query_pairs_mut().append_pair(TOKEN_PARAM, REDACTED);

        Ok(ProviderRequest::new(url.as_str()).with_display_url(display.as_str()))
    }

    fn validate_payload(&self, payload: &Value) -> Result<()> {
        let failed = payload.get("success").and_then(Value::as_bool) == Some(false);
        let Some(error) = payload.get("error").filter(|e| !e.is_null()) else {
            if failed {
                return Err(GeoError::payload(400, "Provider reported an unsuccessful lookup"));
            }
            return Ok(());
        };

        let message = non_empty_str(error, "info")
            .or_else(|| non_empty_str(error, "type"))
            .unwrap_or_else(|| "Provider returned an error".to_string());

        let status = match error.get("type").and_then(Value::as_str) {
            Some(INVALID_ACCESS_KEY) => 401,
            _ => 400,
        };

        Err(GeoError::payload(status, message))
    }

    fn extract_country_name(&self, payload: &Value) -> Option<String> {
        non_empty_str(payload, "country_name")
    }
}
