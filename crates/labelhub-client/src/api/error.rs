//! Errors produced by fetch functions
//!
//! `ApiError` is `Clone` because one in-flight request may be awaited by several
//! de-duplicated callers, and every one of them receives the same failure.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// Connection-level failure (unreachable host, reset, TLS, timeout)
    #[error("Network request failed: {0}")]
    Network(String),

    /// The body was not the JSON shape the DTO expects
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// A cache key was reused for a different value type
    #[error("Cached value has an unexpected type for key {0}")]
    CacheType(String),
}

impl ApiError {
    /// Build a `RequestFailed` from an error response body
    ///
    /// Uses the body's `detail` field when it carries a message, otherwise the
    /// endpoint's fallback.
    pub fn from_response(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| fallback.to_string());
        Self::RequestFailed {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status for `RequestFailed`, `None` otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ValidationIssue {
    msg: String,
}

/// Extract a human message from `{"detail": ...}`
///
/// `detail` is either a string or a list of validation issues with `msg` fields.
fn detail_message(body: &str) -> Option<String> {
    let detail = serde_json::from_str::<ErrorBody>(body).ok()?.detail?;

    match detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<ValidationIssue>(item).ok())
                .map(|issue| issue.msg)
                .collect();

            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        },
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string_becomes_message() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, r#"{"detail":"not found"}"#, "Failed to fetch model");
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_detail_uses_fallback() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "", "Failed to fetch model");
        assert_eq!(err.to_string(), "Failed to fetch model");

        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", "Failed to fetch model");
        assert_eq!(err.to_string(), "Failed to fetch model");

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"detail":""}"#, "fallback");
        assert_eq!(err.to_string(), "fallback");
    }

    #[test]
    fn test_validation_list_is_joined() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"},{"loc":["body","scopes"],"msg":"must not be empty"}]}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body, "fallback");
        assert_eq!(err.to_string(), "field required; must not be empty");
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"detail":"token expired"}"#, "x");
        assert!(err.is_unauthorized());
        assert!(!ApiError::Network("refused".into()).is_unauthorized());
    }
}
