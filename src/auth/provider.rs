// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User provider contract.

use super::{Authenticatable, Credentials, UserId};

/// Looks up and validates users independently of the session mechanism.
///
/// A provider error means the provider itself failed (backend down, corrupt
/// data). "No such user" and "wrong password" are `Ok(None)` / `Ok(false)`.
///
/// Methods are blocking. Async hosts call
/// [`validate_credentials`](UserProvider::validate_credentials) from the
/// blocking pool, since password verification is CPU bound.
pub trait UserProvider: Send + Sync {
    type User: Authenticatable + Clone + Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    fn retrieve_by_id(&self, id: &UserId) -> Result<Option<Self::User>, Self::Error>;

    /// Find the candidate user the credentials refer to, without checking
    /// secrets.
    fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Self::User>, Self::Error>;

    /// Check the credentials' secrets against a candidate user.
    fn validate_credentials(
        &self,
        user: &Self::User,
        credentials: &Credentials,
    ) -> Result<bool, Self::Error>;
}
