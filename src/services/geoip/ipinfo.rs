//! ipinfo 风格 Provider
//!
//! `GET {base}/{ip}` + `Authorization: Bearer {token}`，国家字段为 `country`。
//! 任何 `error` 字段都视为通用 400 错误。
//!
//! 默认 base 是 Lite 接口 (`https://api.ipinfo.io/lite`)，其 `country` 为国家全名；
//! 旧的 `https://ipinfo.io` 接口只返回两位国家代码。

use serde_json::Value;

use super::provider::{ProviderRequest, ProviderStrategy, endpoint, non_empty_str};
use crate::errors::{GeoError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct IpinfoStrategy;

impl ProviderStrategy for IpinfoStrategy {
    fn name(&self) -> &'static str {
        "ipinfo"
    }

    fn build_request(&self, base_url: &str, token: &str, ip: &str) -> Result<ProviderRequest> {
        let url = endpoint(base_url, ip)?;

        Ok(ProviderRequest::new(url.as_str())
            .with_header("Authorization", format!("Bearer {}", token))
            .with_header("Accept", "application/json"))
    }

    fn validate_payload(&self, payload: &Value) -> Result<()> {
        let Some(error) = payload.get("error").filter(|e| !e.is_null()) else {
            return Ok(());
        };

        // error 可能是字符串，也可能是 {"title", "message"}
        let message = error
            .as_str()
            .map(String::from)
            .or_else(|| non_empty_str(error, "message"))
            .or_else(|| non_empty_str(error, "title"))
            .unwrap_or_else(|| "Provider returned an error".to_string());

        Err(GeoError::payload(400, message))
    }

    fn extract_country_name(&self, payload: &Value) -> Option<String> {
        non_empty_str(payload, "country")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request_uses_bearer_header() {
        let req = IpinfoStrategy
            .build_request("https://ipinfo.io", "tok", "8.8.8.8")
            .unwrap();

        assert_eq!(req.url, "https://ipinfo.io/8.8.8.8");
        assert_eq!(req.display_url, req.url);
        assert!(
            req.headers
                .contains(&("Authorization".to_string(), "Bearer tok".to_string()))
        );
    }

    #[test]
    fn test_error_object_is_generic_400() {
        let payload = json!({
            "status": 404,
            "error": { "title": "Wrong ip", "message": "Please provide a valid IP address" }
        });

        let err = IpinfoStrategy.validate_payload(&payload).unwrap_err();
        assert_eq!(err, GeoError::payload(400, "Please provide a valid IP address"));
    }

    #[test]
    fn test_string_error() {
        let err = IpinfoStrategy
            .validate_payload(&json!({ "error": "Invalid token" }))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), "Invalid token");
    }

    #[test]
    fn test_extracts_country_field() {
        let payload = json!({ "ip": "8.8.8.8", "city": "Mountain View", "country": "US" });
        assert!(IpinfoStrategy.validate_payload(&payload).is_ok());
        assert_eq!(IpinfoStrategy.extract_country_name(&payload).as_deref(), Some("US"));
    }

    #[test]
    fn test_bogon_has_no_country() {
        let payload = json!({ "ip": "10.0.0.1", "bogon": true });
        assert!(IpinfoStrategy.validate_payload(&payload).is_ok());
        assert_eq!(IpinfoStrategy.extract_country_name(&payload), None);
    }

    #[test]
    fn test_lite_endpoint_yields_full_country_name() {
        let req = IpinfoStrategy
            .build_request("https://api.ipinfo.io/lite", "tok", "8.8.8.8")
            .unwrap();
        assert_eq!(req.url, "https://api.ipinfo.io/lite/8.8.8.8");

        let payload = json!({
            "ip": "8.8.8.8",
            "asn": "AS15169",
            "as_name": "Google LLC",
            "country_code": "US",
            "country": "United States",
            "continent_code": "NA",
            "continent": "North America"
        });
        assert!(IpinfoStrategy.validate_payload(&payload).is_ok());
        assert_eq!(
            IpinfoStrategy.extract_country_name(&payload).as_deref(),
            Some("United States")
        );
    }
}
