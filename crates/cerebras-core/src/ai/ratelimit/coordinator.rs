//! Shared rate-limit state for concurrent chat requests
//!
//! All in-flight request flows consult one coordinator. The flow that sees
//! a 429 publishes a resume deadline and every flow waits on it; further
//! 429s may extend the deadline while waits are in progress, so waiters
//! re-check after every timer instead of assuming readiness.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{MAX_WAIT_MS, MIN_WAIT_SECONDS, ONE_SECOND_MS};
use crate::ai::error::{ApiError, CerebrasError};
use crate::ai::progress::{ProgressSink, ResponsePart};

/// Marker Cerebras puts in 429 messages when the daily quota is gone
const DAILY_QUOTA_MARKER: &str = "tokens per day limit exceeded";

static REQUEST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)request id:\s*([0-9a-f-]+)").unwrap());

/// Coordinates rate-limit waits across concurrent request flows.
#[derive(Default)]
pub struct RateLimitCoordinator {
    /// Epoch milliseconds before which no new request should be sent
    resume_at: Mutex<Option<u64>>,
    /// Flows currently blocked in `await_resumption`
    waiters: Mutex<HashSet<u64>>,
    /// Id source for waiter handles
    next_waiter_id: AtomicU64,
}

impl RateLimitCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the dedicated rate-limit type or any API error with HTTP 429.
    pub fn is_rate_limit_error(&self, error: &CerebrasError) -> bool {
        match error {
            CerebrasError::RateLimit(_) => true,
            CerebrasError::Api(api) => api.status == 429,
            _ => false,
        }
    }

    /// True only for a 429 whose message marks daily quota exhaustion.
    ///
    /// A daily quota is terminal for the session: waiting it out is
    /// pointless, unlike the per-minute limits this coordinator absorbs.
    pub fn is_daily_quota_error(&self, error: &CerebrasError) -> bool {
        let Some(api) = error.api_error() else {
            return false;
        };
        api.status == 429
            && api
                .message_text()
                .to_lowercase()
                .contains(DAILY_QUOTA_MARKER)
    }

    /// Number of flows currently waiting on the deadline.
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Current resume deadline in epoch milliseconds, if any.
    pub fn resume_at(&self) -> Option<u64> {
        *self.resume_at.lock()
    }

    /// Record when requests may resume.
    ///
    /// `None` clears the deadline. Timestamps in the past snap to now;
    /// future timestamps are clamped so nobody waits more than the
    /// thirty-minute horizon. Concurrent callers race benignly: the last
    /// write wins and waiters pick it up on their next re-check.
    pub fn set_resume_deadline(&self, timestamp: Option<u64>) {
        let value = timestamp.map(|ts| {
            let now = now_millis();
            if ts <= now {
                now
            } else {
                ts.min(now + MAX_WAIT_MS)
            }
        });
        *self.resume_at.lock() = value;
        debug!(resume_at = ?value, "rate limit resume deadline updated");
    }

    /// Wait until the shared deadline passes or the caller cancels.
    ///
    /// Returns `true` when the caller may retry and `false` on
    /// cancellation. Cancellation leaves the deadline in place since other
    /// waiters may still need it. The waiter registration is released on
    /// every exit path.
    pub async fn await_resumption(
        &self,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> bool {
        let waiter_id = self.next_waiter_id.fetch_add(1, Ordering::Relaxed);
        self.waiters.lock().insert(waiter_id);
        let _waiter = scopeguard::guard((), |_| {
            self.waiters.lock().remove(&waiter_id);
        });

        loop {
            let Some(resume_at) = *self.resume_at.lock() else {
                return true;
            };

            let now = now_millis();
            if resume_at <= now {
                // Clear only if no other flow superseded the deadline
                let mut slot = self.resume_at.lock();
                if *slot == Some(resume_at) {
                    *slot = None;
                }
                return true;
            }

            let wait_ms = (resume_at - now).min(MAX_WAIT_MS);
            let remaining_secs = MIN_WAIT_SECONDS.max(wait_ms.div_ceil(ONE_SECOND_MS));
            progress.report(ResponsePart::text(format!(
                "Rate limit active. Resuming in ~{remaining_secs}s...\n"
            )));

            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(Duration::from_millis(wait_ms)) => {}
            }

            if cancel.is_cancelled() {
                return false;
            }
            // Timer expired; the deadline may have been extended, so loop
        }
    }

    /// Report a terminal daily-quota error and clear the deadline.
    ///
    /// Emits one advisory line to the progress sink and a structured
    /// diagnostic to the log. The deadline is always cleared afterward:
    /// once the daily quota is gone, waiting within this session cannot
    /// help.
    pub fn report_quota_exceeded(&self, progress: &dyn ProgressSink, error: &ApiError) {
        let message = error.message_text();
        let request_id = REQUEST_ID_RE
            .captures(&message)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string());

        warn!(
            scope = "daily_token_limit",
            timestamp = %chrono::Utc::now().to_rfc3339(),
            request_id = request_id.as_deref().unwrap_or(""),
            message = %message,
            "Cerebras API daily token limit hit"
        );

        let advisory = match &request_id {
            Some(id) => format!(
                "Cerebras daily token quota exceeded (request {id}). \
                 Please wait for the quota to reset or upgrade your plan before retrying.\n"
            ),
            None => "Cerebras daily token quota exceeded. \
                     Please wait for the quota to reset or upgrade your plan before retrying.\n"
                .to_string(),
        };
        progress.report(ResponsePart::text(advisory));

        self.set_resume_deadline(None);
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
