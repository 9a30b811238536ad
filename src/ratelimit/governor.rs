//! Fixed-window request governor.
//!
//! One counter per key, reset when a request arrives at or after the
//! window's end. A burst that straddles a window boundary can admit up to
//! `2 * limit` requests in quick succession; this is the accepted cost of
//! keeping one integer and one timestamp per caller.
//!
//! The bucket map sits behind a `RwLock`. Known keys are consumed under the
//! shared read lock plus that key's own mutex, so distinct callers never
//! serialize against each other. The write lock is taken only to insert a
//! new key or to sweep expired ones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;

use super::clock::{Clock, SystemClock};
use crate::core::config::RateRule;
use crate::core::errors::ApiError;

/// Outcome of a single [`RateGovernor::check_and_consume`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_at: i64,
}

#[derive(Debug)]
struct RateBucket {
    count: u32,
    window_reset_at: i64,
}

impl RateBucket {
    fn expired() -> Self {
        Self {
            count: 0,
            window_reset_at: i64::MIN,
        }
    }

    fn consume(&mut self, now: i64, limit: u32, window_ms: i64) -> RateDecision {
        if now >= self.window_reset_at {
            self.count = 1;
            self.window_reset_at = now.saturating_add(window_ms);
            return RateDecision {
                allowed: true,
                remaining: limit - 1,
                reset_at: self.window_reset_at,
            };
        }

        if self.count < limit {
            self.count += 1;
            return RateDecision {
                allowed: true,
                remaining: limit - self.count,
                reset_at: self.window_reset_at,
            };
        }

        RateDecision {
            allowed: false,
            remaining: 0,
            reset_at: self.window_reset_at,
        }
    }
}

pub struct RateGovernor {
    buckets: RwLock<HashMap<String, Mutex<RateBucket>>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Counts one request against `key` and reports whether it may proceed.
    ///
    /// A rejected request leaves the bucket untouched. A `limit` of zero
    /// rejects everything without creating a bucket.
    pub fn check_and_consume(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);

        if limit == 0 {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: self.clock.now_ms().saturating_add(window_ms),
            };
        }

        {
            let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(bucket) = buckets.get(key) {
                let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
                return bucket.consume(self.clock.now_ms(), limit, window_ms);
            }
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(RateBucket::expired()));
        bucket
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .consume(self.clock.now_ms(), limit, window_ms)
    }

    /// [`Self::check_and_consume`] with a configured rule, turning a
    /// rejection into [`ApiError::RateLimited`].
    pub fn admit(&self, key: &str, rule: RateRule) -> Result<RateDecision, ApiError> {
        let decision =
            self.check_and_consume(key, rule.limit, Duration::from_millis(rule.window_ms));
        if decision.allowed {
            Ok(decision)
        } else {
            tracing::info!("Rate limit hit for {}", key);
            Err(ApiError::RateLimited {
                remaining: decision.remaining,
                reset_at: decision.reset_at,
            })
        }
    }

    /// Drops buckets whose window has ended. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            let bucket = bucket.get_mut().unwrap_or_else(PoisonError::into_inner);
            now < bucket.window_reset_at
        });
        before - buckets.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Runs [`RateGovernor::sweep_expired`] on a fixed interval until the
/// runtime shuts down.
pub fn spawn_sweeper(
    governor: Arc<RateGovernor>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = governor.sweep_expired();
            if removed > 0 {
                tracing::debug!(
                    "Swept {} expired rate buckets ({} remain)",
                    removed,
                    governor.tracked_keys()
                );
            }
        }
    })
}
