// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors as seen by HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::GuardError;

/// Authentication error type.
///
/// Store and provider failures are reported as 5xx without internals; the
/// cause is logged where the conversion happens.
#[derive(Debug)]
pub enum AuthError {
    /// No live session for the presented token (or no token at all)
    Unauthenticated,
    /// Credentials did not match a user
    InvalidCredentials,
    /// Guard was already logged out
    SessionEnded,
    /// Session store could not be reached
    StoreUnavailable,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::SessionEnded => "session_ended",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::SessionEnded => StatusCode::UNAUTHORIZED,
            AuthError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "A valid session token is required"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::SessionEnded => write!(f, "Session has already ended"),
            AuthError::StoreUnavailable => write!(f, "Session store is unavailable"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<GuardError> for AuthError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Unauthenticated => AuthError::Unauthenticated,
            GuardError::LoggedOut => AuthError::SessionEnded,
            GuardError::Store(e) => {
                tracing::error!(error = %e, "Session store failure");
                AuthError::StoreUnavailable
            }
            GuardError::Provider(e) => {
                tracing::error!(error = %e, "User provider failure");
                AuthError::InternalError("user lookup failed".to_string())
            }
            GuardError::Token(e) => {
                tracing::error!(error = %e, "Token generation failure");
                AuthError::InternalError("could not issue a session token".to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
