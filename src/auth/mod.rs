// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Opaque-token sessions for the API.
//!
//! ## Auth Flow
//!
//! 1. Client posts credentials to `/v1/auth/login`
//! 2. Server checks them against the [`UserProvider`] and, on success,
//!    stores `auth:{token} -> { user_id, expires_on }` with a TTL
//! 3. Client sends `Authorization: <token>` (verbatim, no `Bearer` prefix)
//! 4. Each request gets its own [`TokenGuard`] that resolves the token to a
//!    user at most once
//! 5. `/v1/auth/logout` deletes the record; the token is dead immediately
//!
//! ## Security
//!
//! - Tokens are 256 bits from the system CSPRNG
//! - Expiry is enforced by the store TTL
//! - Credentials are redacted in logs and audit records

pub mod credentials;
pub mod error;
pub mod events;
pub mod extractor;
pub mod factory;
pub mod guard;
pub mod middleware;
pub mod provider;
pub mod request;
pub mod token;
pub mod user;

pub use credentials::Credentials;
pub use error::AuthError;
pub use events::{AuthEvent, AuthEventKind, EventSink};
pub use extractor::{Auth, Guard, OptionalAuth};
pub use factory::GuardFactory;
pub use guard::{GuardError, GuardResult, TokenGuard};
pub use provider::UserProvider;
pub use request::{EmptyRequest, RequestAccessor};
pub use user::{Authenticatable, UserId};
