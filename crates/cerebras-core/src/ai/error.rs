//! Error types for the Cerebras API surface
//!
//! Upstream failures carry their HTTP status, response headers, and any
//! structured payload so the rate-limit layer can classify them without
//! going back to the wire response.

use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

/// An error response from the Cerebras API.
#[derive(Debug, Clone, Default)]
pub struct ApiError {
    /// HTTP status code of the failed response
    pub status: u16,
    /// Response headers (case-insensitive, multi-valued)
    pub headers: HeaderMap,
    /// Error message, if the SDK surfaced one directly
    pub message: Option<String>,
    /// Structured error payload from the response body
    pub payload: Option<Value>,
}

impl ApiError {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Best human-readable message for this error.
    ///
    /// Prefers the explicit message, then a `message` field in the payload,
    /// then a generic line with the status code. Malformed payloads fall
    /// through rather than fail.
    pub fn message_text(&self) -> String {
        if let Some(message) = self.message.as_deref() {
            if !message.is_empty() {
                return message.to_string();
            }
        }

        if let Some(payload) = &self.payload {
            if let Some(message) = payload.get("message").and_then(Value::as_str) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }

        format!("Cerebras API error (status {})", self.status)
    }
}

/// Errors surfaced by the Cerebras backend.
#[derive(Debug, Error)]
pub enum CerebrasError {
    /// The server throttled the request (dedicated rate-limit error type)
    #[error("rate limited: {}", .0.message_text())]
    RateLimit(ApiError),

    /// Any other API error response
    #[error("API error: {}", .0.message_text())]
    Api(ApiError),

    /// Transport-level failure before a response was received
    #[error("network error: {0}")]
    Network(String),

    /// The request flow was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,
}

impl CerebrasError {
    /// The underlying API error, for variants that carry one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CerebrasError::RateLimit(api) | CerebrasError::Api(api) => Some(api),
            _ => None,
        }
    }
}
