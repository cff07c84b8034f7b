// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token Guard - opaque bearer token sessions
//!
//! Per-request session guard backed by a TTL key-value store, with a small
//! axum service on top.
//!
//! ## Modules
//!
//! - `auth` - Session guard, user provider contract, notifications
//! - `storage` - Token stores (memory, redb) and the user directory
//! - `api` - HTTP API handlers (Axum)
//! - `reaper` - Background sweep of expired sessions

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod reaper;
pub mod state;
pub mod storage;
