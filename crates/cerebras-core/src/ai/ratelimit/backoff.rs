//! Exponential backoff with jitter
//!
//! Used when a throttling response carries no usable server hint.

use std::time::Duration;

use rand::Rng;

use super::{BASE_BACKOFF_MS, MAX_BACKOFF_MS, MAX_JITTER_MS};

/// How the retry driver picks a delay after a throttled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Use the server-provided hint when present, computed backoff otherwise
    PreferServerHint,
    /// Always use computed backoff, ignoring server hints
    BackoffOnly,
}

/// Configuration for rate-limit retries
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts allowed after the initial request
    pub max_retries: u32,
    /// Delay selection policy
    pub strategy: DelayStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            strategy: DelayStrategy::PreferServerHint,
        }
    }
}

/// Calculate the backoff delay for a retry attempt.
///
/// `attempt` is 1-based; values below 1 are treated as the first attempt.
/// Uniform jitter of up to one second is added before the cap so
/// independent callers do not retry in lockstep.
pub fn compute_backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let base_delay = BASE_BACKOFF_MS << exponent;
    let jitter_ms = rand::thread_rng().gen_range(0..MAX_JITTER_MS);
    Duration::from_millis(base_delay.saturating_add(jitter_ms).min(MAX_BACKOFF_MS))
}
