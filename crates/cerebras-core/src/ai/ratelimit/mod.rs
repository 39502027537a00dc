//! Rate limiting for the Cerebras API
//!
//! Detects throttling responses, extracts server retry hints, and
//! coordinates concurrent chat requests around a single shared resume
//! deadline with cancellable waits.

mod backoff;
mod coordinator;
mod execute;
mod hints;

pub use backoff::{compute_backoff_delay, DelayStrategy, RetryConfig};
pub use coordinator::RateLimitCoordinator;
pub use execute::execute_with_rate_limit;
pub use hints::extract_retry_delay;

pub(crate) const ONE_SECOND_MS: u64 = 1_000;
pub(crate) const BASE_BACKOFF_MS: u64 = 1_000;
pub(crate) const MAX_BACKOFF_MS: u64 = 15_000;
pub(crate) const MAX_JITTER_MS: u64 = 1_000;
pub(crate) const MIN_WAIT_SECONDS: u64 = 1;
/// Cap waits to thirty minutes to avoid excessive delays
pub(crate) const MAX_WAIT_MS: u64 = 30 * 60 * 1_000;
