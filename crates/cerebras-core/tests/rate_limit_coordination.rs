//! Multi-flow rate-limit coordination tests
//!
//! Exercises the shared deadline across concurrent request flows: waiter
//! bookkeeping, per-flow cancellation, and mid-wait deadline extension.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use cerebras_core::ai::progress::{ProgressSink, ResponsePart};
use cerebras_core::ai::ratelimit::RateLimitCoordinator;

#[derive(Default)]
struct RecordingSink {
    parts: Mutex<Vec<ResponsePart>>,
}

impl RecordingSink {
    fn notice_count(&self) -> usize {
        self.parts.lock().len()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, part: ResponsePart) {
        self.parts.lock().push(part);
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[tokio::test]
async fn test_cancelling_one_waiter_leaves_the_other() {
    let coordinator = Arc::new(RateLimitCoordinator::new());
    coordinator.set_resume_deadline(Some(now_millis() + 400));

    let cancel_a = CancellationToken::new();
    let cancel_b = CancellationToken::new();

    let waiter_a = {
        let coordinator = Arc::clone(&coordinator);
        let cancel = cancel_a.clone();
        tokio::spawn(async move {
            let sink = RecordingSink::default();
            coordinator.await_resumption(&sink, &cancel).await
        })
    };
    let waiter_b = {
        let coordinator = Arc::clone(&coordinator);
        let cancel = cancel_b.clone();
        tokio::spawn(async move {
            let sink = RecordingSink::default();
            coordinator.await_resumption(&sink, &cancel).await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(coordinator.waiter_count(), 2);

    cancel_a.cancel();
    assert!(!waiter_a.await.unwrap(), "cancelled waiter must report false");

    // The second flow is unaffected and resumes when the deadline passes
    assert!(waiter_b.await.unwrap(), "surviving waiter must resume");
    assert_eq!(coordinator.waiter_count(), 0);
}

#[tokio::test]
async fn test_extended_deadline_observed_mid_wait() {
    let coordinator = Arc::new(RateLimitCoordinator::new());
    coordinator.set_resume_deadline(Some(now_millis() + 200));

    let waiter = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            let sink = RecordingSink::default();
            let cancel = CancellationToken::new();
            let started = Instant::now();
            let resumed = coordinator.await_resumption(&sink, &cancel).await;
            (resumed, started.elapsed(), sink.notice_count())
        })
    };

    // Another flow hits a 429 while the first is already waiting
    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.set_resume_deadline(Some(now_millis() + 600));

    let (resumed, elapsed, notices) = waiter.await.unwrap();
    assert!(resumed);
    assert!(
        elapsed >= Duration::from_millis(550),
        "waiter resumed after {elapsed:?}, before the extended deadline"
    );
    // One notice for the first wait, one after the re-check
    assert_eq!(notices, 2);
}

#[tokio::test]
async fn test_waiters_share_one_deadline_release() {
    let coordinator = Arc::new(RateLimitCoordinator::new());
    coordinator.set_resume_deadline(Some(now_millis() + 250));

    let mut waiters = Vec::new();
    for _ in 0..4 {
        let coordinator = Arc::clone(&coordinator);
        waiters.push(tokio::spawn(async move {
            let sink = RecordingSink::default();
            let cancel = CancellationToken::new();
            coordinator.await_resumption(&sink, &cancel).await
        }));
    }

    for waiter in waiters {
        assert!(waiter.await.unwrap());
    }
    assert_eq!(coordinator.resume_at(), None);
    assert_eq!(coordinator.waiter_count(), 0);
}
