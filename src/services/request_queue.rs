//! Single-flight FIFO queue for provider calls.
//!
//! At most one provider call runs at a time. Waiters are served in arrival
//! order (tokio's mutex is fair) and consecutive calls are spaced by at least
//! the configured minimum interval.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::sync::Mutex;

pub struct RequestQueue {
    slot: Mutex<()>,
    spacing: Option<DefaultDirectRateLimiter>,
}

impl RequestQueue {
    /// Queue with `min_interval` between call starts. A zero interval
    /// disables spacing.
    pub fn new(min_interval: Duration) -> Self {
        let spacing = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self {
            slot: Mutex::new(()),
            spacing,
        }
    }

    /// Wait for this caller's turn, then run `operation` while holding the
    /// slot.
    pub async fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _turn = self.slot.lock().await;
        if let Some(limiter) = &self.spacing {
            limiter.until_ready().await;
        }
        operation().await
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("spaced", &self.spacing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_runs_one_at_a_time() {
        let queue = Arc::new(RequestQueue::new(Duration::ZERO));
        let running = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                queue
                    .run(|| async {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spacing_between_calls() {
        let queue = RequestQueue::new(Duration::from_millis(50));
        let started = Instant::now();

        queue.run(|| async {}).await;
        queue.run(|| async {}).await;

        assert!(started.elapsed() >= Duration::from_millis(45));
    }
}
