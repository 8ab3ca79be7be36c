// Rate limiter - fixed windows per (client, bucket).
//
// A window starts at the first hit and lasts for the bucket's window length.
// Counting happens in a CounterStore so the counters can move out of process
// without touching the gateway.

use super::rate_limit_models::{Admission, RateBucket, WindowHit};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record one hit, opening a new window when none is active at `now`.
    /// Must be atomic per (client, bucket).
    async fn hit(
        &self,
        client: &str,
        bucket: RateBucket,
        window: Duration,
        now: Instant,
    ) -> WindowHit;

    /// Give back one hit in the active window, if any.
    async fn refund(&self, client: &str, bucket: RateBucket, now: Instant);

    /// Drop windows that ended before `now`. Returns how many were removed.
    async fn sweep(&self, now: Instant) -> usize;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct RateLimitService<S: CounterStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CounterStore + ?Sized> RateLimitService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn admit(&self, client: &str, bucket: RateBucket) -> Admission {
        self.admit_at(client, bucket, Instant::now()).await
    }

    pub async fn admit_at(&self, client: &str, bucket: RateBucket, now: Instant) -> Admission {
        let policy = bucket.policy();
        let hit = self.store.hit(client, bucket, policy.window, now).await;

        let reset_after = hit.resets_at.saturating_duration_since(now);

        if hit.hits <= policy.max_hits {
            Admission::Allowed {
                remaining: policy.max_hits - hit.hits,
                reset_after,
            }
        } else {
            let retry_after = reset_after;
            tracing::warn!(
                client = %client,
                bucket = %bucket,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Admission::Throttled { retry_after }
        }
    }

    /// Return an admission for a request that should not count.
    pub async fn refund(&self, client: &str, bucket: RateBucket) {
        self.store.refund(client, bucket, Instant::now()).await;
    }

    /// Drop expired windows.
    pub async fn sweep(&self) -> usize {
        let removed = self.store.sweep(Instant::now()).await;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired rate limit windows");
        }
        removed
    }
}
