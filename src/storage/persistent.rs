// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent session store on redb.
//!
//! Sessions survive restarts. redb has no native TTL, so each value carries
//! the instant its TTL runs out; expired values are reported as absent and
//! removed lazily, and [`SessionStore::purge_expired`] sweeps the table.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::session::{expiry_after, SessionRecord, SessionStore, StoreResult};

/// Map: session key (`auth:<token>`) → JSON-encoded [`StoredSession`].
const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// On-disk value: the record plus the store-level expiry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

pub struct RedbSessionStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl RedbSessionStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db, clock })
    }

    fn read(&self, key: &str) -> StoreResult<Option<StoredSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

impl SessionStore for RedbSessionStore {
    fn get(&self, key: &str) -> StoreResult<Option<SessionRecord>> {
        let Some(stored) = self.read(key)? else {
            return Ok(None);
        };
        if self.clock.now() < stored.expires_at {
            return Ok(Some(stored.record));
        }
        self.forget(key)?;
        Ok(None)
    }

    fn put(&self, key: &str, record: SessionRecord, ttl: Duration) -> StoreResult<()> {
        let stored = StoredSession {
            record,
            expires_at: expiry_after(self.clock.now(), ttl),
        };
        let json = serde_json::to_vec(&stored)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn forget(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self
            .read(key)?
            .map(|stored| self.clock.now() < stored.expires_at)
            .unwrap_or(false))
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                match serde_json::from_slice::<StoredSession>(value.value()) {
                    Ok(stored) if stored.expires_at > now => {}
                    Ok(_) => expired.push(key.value().to_string()),
                    Err(e) => {
                        tracing::warn!(key = key.value(), error = %e, "Dropping unreadable session entry");
                        expired.push(key.value().to_string());
                    }
                }
            }
            for key in &expired {
                table.remove(key.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
