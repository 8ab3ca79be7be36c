// In-memory counter store for the rate limiter.
//
// Counters reset when the process restarts. DashMap holds the shard lock for
// the whole entry update, so two requests from the same client can't both
// read the same count.

use crate::core::rate_limit::{CounterStore, RateBucket, WindowHit};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct CounterKey {
    client: String,
    bucket: RateBucket,
}

#[derive(Clone, Copy, Debug)]
struct Window {
    hits: u32,
    resets_at: Instant,
}

pub struct InMemoryCounterStore {
    windows: DashMap<CounterKey, Window>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn hit(
        &self,
        client: &str,
        bucket: RateBucket,
        window: Duration,
        now: Instant,
    ) -> WindowHit {
        let key = CounterKey {
            client: client.to_string(),
            bucket,
        };

        let mut entry = self.windows.entry(key).or_insert(Window {
            hits: 0,
            resets_at: now + window,
        });
        if now >= entry.resets_at {
            *entry = Window {
                hits: 0,
                resets_at: now + window,
            };
        }
        entry.hits = entry.hits.saturating_add(1);

        WindowHit {
            hits: entry.hits,
            resets_at: entry.resets_at,
        }
    }

    async fn refund(&self, client: &str, bucket: RateBucket, now: Instant) {
        let key = CounterKey {
            client: client.to_string(),
            bucket,
        };
        if let Some(mut entry) = self.windows.get_mut(&key) {
            if now < entry.resets_at {
                entry.hits = entry.hits.saturating_sub(1);
            }
        }
    }

    async fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.resets_at);
        before.saturating_sub(self.windows.len())
    }
}
