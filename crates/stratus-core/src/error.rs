use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use crate::constants::{HEADER_COMPUTE_REQUEST_ID, HEADER_OPENSTACK_REQUEST_ID, HEADER_RETRY_AFTER};

/// Response headers keyed by lowercase header name.
pub type HeaderFields = BTreeMap<String, String>;

const MISSING_FIELD: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    OverLimit,
    RateLimit,
    NotImplemented,
    /// Any status without a dedicated kind.
    Http,
}

impl ApiErrorKind {
    pub const MAPPED: [ApiErrorKind; 10] = [
        ApiErrorKind::BadRequest,
        ApiErrorKind::Unauthorized,
        ApiErrorKind::Forbidden,
        ApiErrorKind::NotFound,
        ApiErrorKind::MethodNotAllowed,
        ApiErrorKind::NotAcceptable,
        ApiErrorKind::Conflict,
        ApiErrorKind::OverLimit,
        ApiErrorKind::RateLimit,
        ApiErrorKind::NotImplemented,
    ];

    pub fn status(self) -> Option<u16> {
        match self {
            ApiErrorKind::BadRequest => Some(400),
            ApiErrorKind::Unauthorized => Some(401),
            ApiErrorKind::Forbidden => Some(403),
            ApiErrorKind::NotFound => Some(404),
            ApiErrorKind::MethodNotAllowed => Some(405),
            ApiErrorKind::NotAcceptable => Some(406),
            ApiErrorKind::Conflict => Some(409),
            ApiErrorKind::OverLimit => Some(413),
            ApiErrorKind::RateLimit => Some(429),
            ApiErrorKind::NotImplemented => Some(501),
            ApiErrorKind::Http => None,
        }
    }

    pub fn honors_retry_after(self) -> bool {
        matches!(self, ApiErrorKind::OverLimit | ApiErrorKind::RateLimit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorKind::BadRequest => "bad request",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::NotFound => "not found",
            ApiErrorKind::MethodNotAllowed => "method not allowed",
            ApiErrorKind::NotAcceptable => "not acceptable",
            ApiErrorKind::Conflict => "conflict",
            ApiErrorKind::OverLimit => "over limit",
            ApiErrorKind::RateLimit => "rate limit",
            ApiErrorKind::NotImplemented => "not implemented",
            ApiErrorKind::Http => "http error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn status_table() -> &'static HashMap<u16, ApiErrorKind> {
    static TABLE: OnceLock<HashMap<u16, ApiErrorKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ApiErrorKind::MAPPED
            .iter()
            .filter_map(|kind| kind.status().map(|status| (status, *kind)))
            .collect()
    })
}

pub fn kind_for_status(status: u16) -> ApiErrorKind {
    status_table()
        .get(&status)
        .copied()
        .unwrap_or(ApiErrorKind::Http)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message} (HTTP {status}){}", request_suffix(.request_id))]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub method: Option<String>,
    pub url: Option<String>,
    pub request_id: Option<String>,
    pub message: String,
    pub details: String,
    /// Seconds to wait, only set for over-limit and rate-limit responses.
    pub retry_after: Option<u64>,
}

fn request_suffix(request_id: &Option<String>) -> String {
    request_id
        .as_deref()
        .map(|id| format!(" (Request-ID: {id})"))
        .unwrap_or_default()
}

impl ApiError {
    pub fn with_request(mut self, method: &str, url: &str) -> Self {
        self.method = Some(method.to_string());
        self.url = Some(url.to_string());
        self
    }
}

/// Builds a typed error from a failed response.
pub fn classify(status: u16, headers: &HeaderFields, body: Option<&Value>) -> ApiError {
    let kind = kind_for_status(status);
    let request_id = headers
        .get(HEADER_COMPUTE_REQUEST_ID)
        .or_else(|| headers.get(HEADER_OPENSTACK_REQUEST_ID))
        .cloned();
    let retry_after = if kind.honors_retry_after() {
        headers
            .get(HEADER_RETRY_AFTER)
            .and_then(|value| value.trim().parse::<u64>().ok())
    } else {
        None
    };
    let (message, details) = body.map(envelope_fields).unwrap_or_else(|| {
        (MISSING_FIELD.to_string(), MISSING_FIELD.to_string())
    });
    ApiError {
        kind,
        status,
        method: None,
        url: None,
        request_id,
        message,
        details,
        retry_after,
    }
}

fn envelope_fields(body: &Value) -> (String, String) {
    let Value::Object(map) = body else {
        return (MISSING_FIELD.to_string(), MISSING_FIELD.to_string());
    };
    let envelope = match map.values().next() {
        Some(Value::Object(inner)) => inner,
        _ => map,
    };
    (
        field_text(envelope.get("message")),
        field_text(envelope.get("details")),
    )
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => MISSING_FIELD.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_found_envelope_populates_message() {
        let body = json!({
            "itemNotFound": {
                "message": "Flavor test could not be found.",
                "code": 404
            }
        });
        let err = classify(404, &HeaderFields::new(), Some(&body));
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Flavor test could not be found.");
        assert_eq!(err.details, "n/a");
    }

    #[test]
    fn unmapped_status_is_generic() {
        let err = classify(418, &HeaderFields::new(), None);
        assert_eq!(err.kind, ApiErrorKind::Http);
        assert_eq!(err.status, 418);
        assert_eq!(err.message, "n/a");
    }

    #[test]
    fn first_envelope_wins_in_document_order() {
        let body = json!({
            "zeta": {"message": "first"},
            "alpha": {"message": "second"}
        });
        let err = classify(400, &HeaderFields::new(), Some(&body));
        assert_eq!(err.message, "first");
    }

    #[test]
    fn request_id_and_retry_after_come_from_headers() {
        let mut headers = HeaderFields::new();
        headers.insert("x-compute-request-id".into(), "req-1".into());
        headers.insert("retry-after".into(), "30".into());
        let body = json!({"overLimit": {"message": "slow down", "details": "quota"}});

        let err = classify(413, &headers, Some(&body));
        assert_eq!(err.kind, ApiErrorKind::OverLimit);
        assert_eq!(err.request_id.as_deref(), Some("req-1"));
        assert_eq!(err.retry_after, Some(30));
        assert_eq!(err.details, "quota");

        let err = classify(403, &headers, Some(&body));
        assert_eq!(err.retry_after, None);
        assert!(err.to_string().contains("Request-ID: req-1"));
    }

    #[test]
    fn raw_text_body_keeps_defaults() {
        let body = Value::String("<html>oops</html>".into());
        let err = classify(500, &HeaderFields::new(), Some(&body)).with_request("GET", "http://x");
        assert_eq!(err.message, "n/a");
        assert_eq!(err.method.as_deref(), Some("GET"));
        assert_eq!(err.url.as_deref(), Some("http://x"));
    }
}
