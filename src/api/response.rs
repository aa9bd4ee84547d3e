//! Response envelope
//!
//! Every answer the service gives, success or failure, is normalized into
//! `{ data | error, meta }`. `format_result` is the only place that shape is
//! built.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::GeoError;

/// Status used when an error carries none of its own.
pub const DEFAULT_ERROR_STATUS: u16 = 400;

/// Keys that belong to `meta` and are never copied into `data`.
const META_KEYS: [&str; 5] = ["apiUrl", "cache", "rateLimit", "rateLimitCount", "status"];

/// Raw outcome handed to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Map<String, Value>),
    Error {
        message: String,
        status: Option<u16>,
    },
}

impl Outcome {
    /// Success payload `{ "name": <country> }`.
    pub fn country(name: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("name".to_string(), Value::String(name.into()));
        Outcome::Success(data)
    }
}

impl From<&GeoError> for Outcome {
    fn from(err: &GeoError) -> Self {
        Outcome::Error {
            message: err.message().to_string(),
            status: err.status(),
        }
    }
}

/// Optional metadata attached to an envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaOptions {
    pub api_url: Option<String>,
    pub cache: bool,
    pub rate_limit: Option<u32>,
    pub rate_limit_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_url: Option<String>,
    /// Only present on success envelopes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rate_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rate_limit_count: Option<u32>,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        data: Map<String, Value>,
        meta: Meta,
    },
    Error {
        error: ErrorBody,
        meta: Meta,
    },
}

impl Envelope {
    /// Bare error envelope without provider metadata (404, 408, 500 handlers).
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        format_result(
            Outcome::Error {
                message: message.into(),
                status: Some(status),
            },
            MetaOptions::default(),
        )
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Envelope::Success { meta, .. } | Envelope::Error { meta, .. } => meta,
        }
    }

    pub fn status(&self) -> u16 {
        self.meta().status
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// `data.name` of a success envelope.
    pub fn country_name(&self) -> Option<&str> {
        match self {
            Envelope::Success { data, .. } => data.get("name").and_then(Value::as_str),
            Envelope::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Envelope::Error { error, .. } => Some(&error.message),
            Envelope::Success { .. } => None,
        }
    }
}

/// Turn a raw outcome plus metadata into the canonical envelope.
pub fn format_result(outcome: Outcome, options: MetaOptions) -> Envelope {
    let MetaOptions {
        api_url,
        cache,
        rate_limit,
        rate_limit_count,
    } = options;

    match outcome {
        Outcome::Error { message, status } => Envelope::Error {
            error: ErrorBody { message },
            meta: Meta {
                api_url,
                cache: None,
                rate_limit,
                rate_limit_count,
                status: status.unwrap_or(DEFAULT_ERROR_STATUS),
            },
        },
        Outcome::Success(mut payload) => {
            payload.retain(|key, _| !META_KEYS.contains(&key.as_str()));
            Envelope::Success {
                data: payload,
                meta: Meta {
                    api_url,
                    cache: Some(cache),
                    rate_limit,
                    rate_limit_count,
                    status: 200,
                },
            }
        }
    }
}
