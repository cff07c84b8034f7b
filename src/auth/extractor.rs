// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for session authentication.
//!
//! Use the `Auth` extractor in handlers to require a live session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is DirectoryUser
//! }
//! ```
//!
//! Handlers that need the session itself (login, logout, token, expiry)
//! take a [`Guard`] instead.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, TokenGuard};
use crate::state::AppState;
use crate::storage::{DirectoryUser, UserDirectory};

/// Fresh guard bound to the request headers.
pub struct Guard(pub TokenGuard<UserDirectory>);

impl FromRequestParts<AppState> for Guard {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Guard(state.guards.guard(parts.headers.clone())))
    }
}

/// Extractor for authenticated users.
///
/// Rejects with `401` when the `Authorization` token does not resolve to a
/// user, `503` when the session store is down.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(Auth(user): Auth) -> Json<UserMeResponse> {
///     // user.id is the authenticated user's ID
///     Json(user.into())
/// }
/// ```
pub struct Auth(pub DirectoryUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already resolved the user
        if let Some(user) = parts.extensions.get::<DirectoryUser>().cloned() {
            return Ok(Auth(user));
        }

        let mut guard = state.guards.guard(parts.headers.clone());
        let user = guard.authenticate()?.clone();
        Ok(Auth(user))
    }
}

/// Like [`Auth`] but anonymous requests get `None`.
///
/// Store failures still reject.
pub struct OptionalAuth(pub Option<DirectoryUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<DirectoryUser>().cloned() {
            return Ok(OptionalAuth(Some(user)));
        }

        let mut guard = state.guards.guard(parts.headers.clone());
        let user = guard.user()?.cloned();
        Ok(OptionalAuth(user))
    }
}
