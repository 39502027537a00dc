//! Rate-limit-aware request execution
//!
//! Wraps a request closure with classification, deadline publication, and
//! cancellable waits so the streaming loop only sees terminal outcomes.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::backoff::{compute_backoff_delay, DelayStrategy, RetryConfig};
use super::coordinator::{now_millis, RateLimitCoordinator};
use super::hints::extract_retry_delay;
use crate::ai::error::CerebrasError;
use crate::ai::progress::ProgressSink;

/// Run `op`, absorbing transient rate limits per `config`.
///
/// Daily-quota errors are reported and returned immediately; other
/// non-rate-limit errors propagate untouched. A cancellation that fires
/// mid-wait surfaces as `CerebrasError::Cancelled`.
pub async fn execute_with_rate_limit<T, F, Fut>(
    coordinator: &RateLimitCoordinator,
    config: &RetryConfig,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, CerebrasError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CerebrasError>>,
{
    let mut attempt: u32 = 0;

    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if coordinator.is_daily_quota_error(&error) {
            if let Some(api) = error.api_error() {
                coordinator.report_quota_exceeded(progress, api);
            }
            return Err(error);
        }

        if !coordinator.is_rate_limit_error(&error) {
            return Err(error);
        }

        attempt += 1;
        if attempt > config.max_retries {
            warn!(attempt, "rate limit retries exhausted");
            return Err(error);
        }

        let hint = match config.strategy {
            DelayStrategy::PreferServerHint => error.api_error().and_then(extract_retry_delay),
            DelayStrategy::BackoffOnly => None,
        };
        let from_hint = hint.is_some();
        let delay = hint.unwrap_or_else(|| compute_backoff_delay(attempt));
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            from_hint,
            "rate limited, scheduling retry"
        );

        coordinator.set_resume_deadline(Some(now_millis() + delay.as_millis() as u64));
        if !coordinator.await_resumption(progress, cancel).await {
            return Err(CerebrasError::Cancelled);
        }
    }
}
