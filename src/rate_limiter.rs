use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Outcome of a rate-limit check for one client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Maximum requests admitted per window.
    pub limit: u32,
    /// Requests still available in the current window after this one.
    pub remaining: u32,
    /// Unix epoch milliseconds at which a slot frees up again.
    pub reset_at_ms: i64,
}

/// Admission control keyed by an opaque client identifier.
///
/// The handler only depends on this trait, so a shared store (Redis, etc.) can
/// replace the in-process implementation.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records an attempt for `key` and reports whether it is admitted.
    async fn check(&self, key: &str) -> RateLimitDecision;
}

type RequestLog = Arc<Mutex<VecDeque<i64>>>;

/// In-process sliding-window limiter.
///
/// Keeps a log of admitted request timestamps per client and admits at most
/// `limit` requests within any rolling `window`. Idle clients are evicted
/// after one window of inactivity, and the number of tracked clients is
/// bounded by `max_clients`.
pub struct SlidingWindowLimiter {
    limit: u32,
    window: Duration,
    logs: Cache<String, RequestLog>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: u32, window: Duration, max_clients: u64) -> Self {
        let logs = Cache::builder()
            .time_to_idle(window)
            .max_capacity(max_clients)
            .build();

        Self {
            limit,
            window,
            logs,
        }
    }

    /// Same as [`RateLimiter::check`] with an explicit clock, in epoch milliseconds.
    pub async fn check_at(&self, key: &str, now_ms: i64) -> RateLimitDecision {
        let log = self
            .logs
            .get_with(hash_key(key), async { Arc::new(Mutex::new(VecDeque::new())) })
            .await;

        self.record(&log, now_ms)
    }

    fn record(&self, log: &Mutex<VecDeque<i64>>, now_ms: i64) -> RateLimitDecision {
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        // A panic while holding the lock leaves the log itself intact.
        let mut entries = log.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let window_start = now_ms.saturating_sub(window_ms);
        while entries.front().is_some_and(|&oldest| oldest <= window_start) {
            entries.pop_front();
        }

        let used = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let allowed = used < self.limit;
        if allowed {
            entries.push_back(now_ms);
        }

        let used = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let reset_at_ms = entries
            .front()
            .map_or(now_ms, |&oldest| oldest)
            .saturating_add(window_ms);

        RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            reset_at_ms,
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, chrono::Utc::now().timestamp_millis())
            .await
    }
}

/// Client keys embed raw user agents, so store a fixed-size digest instead.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
