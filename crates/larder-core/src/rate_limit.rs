//! # Rate Limiting
//!
//! Sliding-window limiter keyed by action and identifier.
//!
//! ```text
//!   window (e.g. 15 min)
//!   ◄────────────────────────────►
//! ──┼───x──────x─────x────────────┼──► time
//!   now − window                  now
//!
//!   hits inside the window >= max_hits  →  RateLimited { retry_after_secs }
//!   otherwise                           →  hit recorded, Ok(())
//! ```
//!
//! The store is injected so callers decide where hits live (process memory
//! for the CLI, a shared cache for a server). The clock is passed to
//! [`RateLimiter::check`] so tests never sleep.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};

/// Key under which hits are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub action: String,
    pub identifier: String,
}

impl RateLimitKey {
    pub fn new(action: impl Into<String>, identifier: impl Into<String>) -> Self {
        RateLimitKey {
            action: action.into(),
            identifier: identifier.into(),
        }
    }
}

/// Storage for recorded hits.
///
/// `record_if_below` is the only write on the hot path and must be atomic
/// per key: two callers racing on the same key can never both take the
/// last slot.
pub trait RateLimitStore: Send + Sync {
    /// Drops hits at or before `window_start`, then records `now` if fewer
    /// than `max_hits` remain.
    ///
    /// Returns `Err(oldest)` with the oldest hit still inside the window
    /// when the key is full. Rejected attempts are not recorded.
    fn record_if_below(
        &self,
        key: &RateLimitKey,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
        max_hits: usize,
    ) -> Result<(), DateTime<Utc>>;

    /// Recorded hit timestamps for `key`, oldest first.
    fn load(&self, key: &RateLimitKey) -> Vec<DateTime<Utc>>;

    /// Forgets every hit for `key`.
    fn clear(&self, key: &RateLimitKey);

    /// Removes keys whose hits are all at or before `window_start`.
    /// Returns how many keys were dropped.
    fn prune(&self, window_start: DateTime<Utc>) -> usize;
}

/// Key count below which the memory store never sweeps on its own.
const MIN_SWEEP_AT: usize = 1024;

#[derive(Debug)]
struct HitTable {
    hits: HashMap<RateLimitKey, Vec<DateTime<Utc>>>,
    /// Key count that triggers the next automatic sweep.
    sweep_at: usize,
}

impl Default for HitTable {
    fn default() -> Self {
        HitTable {
            hits: HashMap::new(),
            sweep_at: MIN_SWEEP_AT,
        }
    }
}

impl HitTable {
    fn prune(&mut self, window_start: DateTime<Utc>) -> usize {
        let before = self.hits.len();
        self.hits.retain(|_, hits| {
            hits.retain(|hit| *hit > window_start);
            !hits.is_empty()
        });
        before - self.hits.len()
    }
}

/// In-process store.
///
/// Every operation runs under one lock. Expired keys are swept when the
/// table doubles in size since the last sweep, or on [`RateLimiter::prune`].
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    table: Mutex<HitTable>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.lock().hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HitTable> {
        // A panic while holding the lock cannot leave the map half-written.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn record_if_below(
        &self,
        key: &RateLimitKey,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
        max_hits: usize,
    ) -> Result<(), DateTime<Utc>> {
        let mut guard = self.lock();
        let table = &mut *guard;

        if table.hits.len() >= table.sweep_at {
            table.prune(window_start);
            table.sweep_at = (table.hits.len() * 2).max(MIN_SWEEP_AT);
        }

        let hits = table.hits.entry(key.clone()).or_default();
        hits.retain(|hit| *hit > window_start);

        if hits.len() >= max_hits {
            let oldest = hits.iter().min().copied().unwrap_or(now);
            if hits.is_empty() {
                table.hits.remove(key);
            }
            return Err(oldest);
        }

        hits.push(now);
        Ok(())
    }

    fn load(&self, key: &RateLimitKey) -> Vec<DateTime<Utc>> {
        self.lock().hits.get(key).cloned().unwrap_or_default()
    }

    fn clear(&self, key: &RateLimitKey) {
        self.lock().hits.remove(key);
    }

    fn prune(&self, window_start: DateTime<Utc>) -> usize {
        self.lock().prune(window_start)
    }
}

/// Allows at most `max_hits` per key inside any `window`.
pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    max_hits: usize,
    window: Duration,
}

impl<S: RateLimitStore> RateLimiter<S> {
    pub fn new(store: S, max_hits: usize, window: Duration) -> Self {
        RateLimiter {
            store,
            max_hits,
            window,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a hit for `action`/`identifier` at `now`, or rejects it.
    ///
    /// Rejected attempts are not recorded, so a caller that backs off for
    /// `retry_after_secs` is let through.
    pub fn check(&self, action: &str, identifier: &str, now: DateTime<Utc>) -> CoreResult<()> {
        let key = RateLimitKey::new(action, identifier);

        match self
            .store
            .record_if_below(&key, now - self.window, now, self.max_hits)
        {
            Ok(()) => Ok(()),
            Err(oldest) => {
                let wait = oldest + self.window - now;
                // Round up so a caller never retries a second too early.
                let mut retry_after_secs = wait.num_seconds();
                if wait > Duration::seconds(retry_after_secs) {
                    retry_after_secs += 1;
                }

                Err(CoreError::RateLimited {
                    action: action.to_string(),
                    retry_after_secs: retry_after_secs.max(1),
                })
            }
        }
    }

    /// Forgets every hit for `action`/`identifier`.
    pub fn reset(&self, action: &str, identifier: &str) {
        self.store.clear(&RateLimitKey::new(action, identifier));
    }

    /// Drops every key with no hit inside the window ending at `now`.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        self.store.prune(now - self.window)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
