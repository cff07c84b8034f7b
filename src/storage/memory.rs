// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process session store.
//!
//! Sessions live only as long as the process. Each entry carries its own
//! expiry instant taken from the injected [`Clock`]; expired entries are
//! evicted when they are read. A live session is never evicted: when the
//! store is full, expired entries are swept and a new session that still
//! does not fit is refused with [`StoreError::Full`].

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tracing::warn;

use super::clock::{Clock, SystemClock};
use super::session::{expiry_after, SessionRecord, SessionStore, StoreError, StoreResult};

/// Default number of live sessions kept in memory.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Cached record + the instant the store TTL runs out.
struct CacheEntry {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

pub struct InMemorySessionStore {
    cache: Mutex<LruCache<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// Create a store holding at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    /// Number of entries held, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drop_expired(cache: &mut LruCache<String, CacheEntry>, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> StoreResult<Option<SessionRecord>> {
        let now = self.clock.now();
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(entry) = cache.get(key) {
            if now < entry.expires_at {
                return Ok(Some(entry.record.clone()));
            }
            // expired, drop it
            cache.pop(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, record: SessionRecord, ttl: Duration) -> StoreResult<()> {
        let now = self.clock.now();
        let expires_at = expiry_after(now, ttl);
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;

        // `LruCache::put` would silently evict a live session
        if !cache.contains(key) && cache.len() >= cache.cap().get() {
            Self::drop_expired(&mut cache, now);
            if cache.len() >= cache.cap().get() {
                warn!(capacity = cache.cap().get(), "Session store full, refusing new session");
                return Err(StoreError::Full(cache.len()));
            }
        }

        cache.put(key.to_string(), CacheEntry { record, expires_at });
        Ok(())
    }

    fn forget(&self, key: &str) -> StoreResult<()> {
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        cache.pop(key);
        Ok(())
    }

    fn has(&self, key: &str) -> StoreResult<bool> {
        let now = self.clock.now();
        let cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        // peek: probing for collisions must not refresh recency
        Ok(cache
            .peek(key)
            .map(|entry| now < entry.expires_at)
            .unwrap_or(false))
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Self::drop_expired(&mut cache, now))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
