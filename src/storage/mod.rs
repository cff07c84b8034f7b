// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Session records live in a key-value store with per-key TTL. Two backends
//! are provided:
//!
//! - [`InMemorySessionStore`]: bounded cache, sessions die with the process
//! - [`RedbSessionStore`]: embedded `redb` database, sessions survive restarts
//!
//! Users are held in a [`UserDirectory`] loaded from a JSON file.
//!
//! ## Key Layout
//!
//! ```text
//! auth:{token} -> { "user_id": "...", "expires_on": "2026-01-01T00:00:00Z" }
//! ```

pub mod clock;
pub mod memory;
pub mod persistent;
pub mod session;
pub mod users;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::InMemorySessionStore;
pub use persistent::RedbSessionStore;
pub use session::{SessionRecord, SessionStore, StoreError, StoreResult};
pub use users::{DirectoryError, DirectoryUser, UserDirectory};
