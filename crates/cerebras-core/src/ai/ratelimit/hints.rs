//! Server-provided retry hints
//!
//! Cerebras reports rate-limit reset times in response headers:
//! - `x-ratelimit-reset-tokens-minute`: seconds until the per-minute token limit resets
//! - `x-ratelimit-reset-requests-day`: seconds until the daily request limit resets
//!
//! A standard `Retry-After` header (RFC 9110) is honored as a fallback in
//! case another infra component intervenes.

use std::time::{Duration, SystemTime};

use reqwest::header::HeaderMap;

use super::{MAX_WAIT_MS, ONE_SECOND_MS};
use crate::ai::error::ApiError;

const RESET_HEADERS: [&str; 2] = [
    "x-ratelimit-reset-tokens-minute",
    "x-ratelimit-reset-requests-day",
];

/// Extract the retry delay from a rate-limit error, if the server provided one.
///
/// Reset headers carry fractional seconds; the conversion to milliseconds
/// rounds up so the wait never undershoots the server's reset time. The
/// result is capped at the thirty-minute horizon. Returns `None` when no
/// usable hint exists; malformed values are skipped, never errors.
pub fn extract_retry_delay(error: &ApiError) -> Option<Duration> {
    let headers = &error.headers;

    for name in RESET_HEADERS {
        if let Some(value) = header_value(headers, name) {
            if let Ok(seconds) = value.trim().parse::<f64>() {
                if seconds.is_finite() && seconds > 0.0 {
                    let delay_ms = (seconds * ONE_SECOND_MS as f64).ceil() as u64;
                    return Some(Duration::from_millis(delay_ms.min(MAX_WAIT_MS)));
                }
            }
        }
    }

    // Retry-After can be either seconds or an HTTP date
    if let Some(value) = header_value(headers, "retry-after") {
        let value = value.trim();

        if let Ok(seconds) = value.parse::<f64>() {
            if seconds.is_finite() {
                let delay_ms = (seconds.max(0.0) * ONE_SECOND_MS as f64) as u64;
                return Some(Duration::from_millis(delay_ms.min(MAX_WAIT_MS)));
            }
        }

        if let Ok(date) = httpdate::parse_http_date(value) {
            // Dates already in the past mean "retry now"
            let delay = date
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);
            let delay_ms = (delay.as_millis() as u64).min(MAX_WAIT_MS);
            return Some(Duration::from_millis(delay_ms));
        }
    }

    None
}

/// First non-empty value for a header name (lookup is case-insensitive).
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
