// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session records and the token store contract.
//!
//! A store maps `"auth:" + token` to a [`SessionRecord`] and enforces the
//! TTL itself: once the TTL has elapsed, `get` and `has` behave as if the key
//! was never written. Single-key operations must be atomic; no multi-key
//! transactions are required.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserId;

/// Session record stored under `"auth:" + token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Identifier of the user the token was issued to.
    pub user_id: UserId,
    /// Moment the session stops being valid.
    pub expires_on: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user_id: UserId, expires_on: DateTime<Utc>) -> Self {
        Self {
            user_id,
            expires_on,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store lock poisoned")]
    LockPoisoned,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store is full ({0} live sessions)")]
    Full(usize),

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store with TTL used to hold session records.
pub trait SessionStore: Send + Sync {
    /// Fetch a live record, `None` if absent or expired.
    fn get(&self, key: &str) -> StoreResult<Option<SessionRecord>>;

    /// Write a record that expires after `ttl`.
    fn put(&self, key: &str, record: SessionRecord, ttl: Duration) -> StoreResult<()>;

    /// Remove a record. Removing an absent key is not an error.
    fn forget(&self, key: &str) -> StoreResult<()>;

    /// Whether a live record exists under `key`.
    fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Drop expired records eagerly, returning how many were removed.
    ///
    /// Stores that evict on their own can keep the default.
    fn purge_expired(&self) -> StoreResult<usize> {
        Ok(0)
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Instant at which an entry written at `now` with `ttl` expires.
///
/// Saturates at the largest representable time instead of overflowing.
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
