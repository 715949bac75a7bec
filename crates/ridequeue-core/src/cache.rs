//! In-memory state cache shared by both aggregates.
//!
//! Maps `(aggregate kind, entity id)` to the last derived state. The cache is
//! bounded by entry count (least-recently-used eviction) and honours a
//! per-entry TTL measured against the injected [`Clock`]. Anything that goes
//! wrong inside the cache (eviction, expiry, a value of the wrong type, a
//! poisoned lock) surfaces as a miss, never as an error.

use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use tracing::warn;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::event::AggregateKind;

/// Cache key: one entry per aggregate instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The aggregate kind.
    pub kind: AggregateKind,
    /// The ride or customer identifier.
    pub id: Uuid,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(kind: AggregateKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

struct CacheEntry {
    value: Box<dyn Any + Send + Sync>,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Bounded, TTL-aware cache of derived aggregate state.
pub struct StateCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    clock: SharedClock,
}

impl fmt::Debug for StateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl StateCache {
    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    /// Returns the cached value for `key` if present, unexpired and of type `T`.
    pub fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.lock() else {
            warn!(%key, "state cache lock poisoned; treating as miss");
            return None;
        };

        let (expired, value) = {
            let entry = entries.get(key)?;
            (
                entry.is_expired(now),
                entry.value.downcast_ref::<T>().cloned(),
            )
        };

        if expired {
            entries.pop(key);
            return None;
        }
        if value.is_none() {
            warn!(%key, "cached value has an unexpected type; treating as miss");
            entries.pop(key);
        }
        value
    }

    /// Stores `value` under `key`.
    ///
    /// With `ttl: None` the entry lives until it is deleted or evicted. A
    /// non-positive TTL stores nothing and drops any previous entry.
    pub fn set<T>(&self, key: CacheKey, value: T, ttl: Option<TimeDelta>)
    where
        T: Send + Sync + 'static,
    {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.lock() else {
            warn!(%key, "state cache lock poisoned; skipping store");
            return;
        };

        if ttl.is_some_and(|ttl| ttl <= TimeDelta::zero()) {
            entries.pop(&key);
            return;
        }

        entries.put(
            key,
            CacheEntry {
                value: Box::new(value),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
    }

    /// Removes the entry for `key`, if any.
    pub fn delete(&self, key: &CacheKey) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.pop(key);
            }
            Err(poisoned) => {
                warn!(%key, "state cache lock poisoned; clearing");
                poisoned.into_inner().clear();
            }
        }
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
