// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints.

use axum::{
    extract::rejection::JsonRejection,
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    Json,
};

use crate::auth::{AuthError, Guard, TokenGuard};
use crate::error::ApiError;
use crate::models::{CredentialsRequest, LoginResponse, SessionResponse, ValidateResponse};
use crate::storage::UserDirectory;

type DirectoryGuard = TokenGuard<UserDirectory>;

/// Run `work` on the blocking pool and hand the guard back.
///
/// Credential checks hash the password with argon2, which must not stall
/// the async workers.
async fn off_runtime<T, F>(
    mut guard: DirectoryGuard,
    work: F,
) -> Result<(DirectoryGuard, T), ApiError>
where
    F: FnOnce(&mut DirectoryGuard) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let output = work(&mut guard);
        (guard, output)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Credential check task failed");
        ApiError::internal("credential check failed")
    })
}

/// Exchange credentials for a session token.
///
/// The token is returned in the body and in the `Authorization` response
/// header; send it back verbatim in `Authorization` on later requests.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Malformed request body"),
        (status = 503, description = "Session store unavailable"),
    )
)]
pub async fn login(
    Guard(guard): Guard,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let Json(request) = payload?;
    let (guard, attempted) =
        off_runtime(guard, move |guard| guard.attempt(&request.credentials, true)).await?;
    if !attempted? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = guard
        .token()
        .map(str::to_owned)
        .ok_or_else(|| ApiError::internal("session token missing after login"))?;
    let expires_on = guard
        .expiration()?
        .ok_or_else(|| ApiError::internal("session record missing after login"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&token).map_err(|e| ApiError::internal(e.to_string()))?,
    );

    Ok((headers, Json(LoginResponse { token, expires_on })))
}

/// Check credentials without starting a session.
#[utoipa::path(
    post,
    path = "/v1/auth/validate",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Validation result", body = ValidateResponse),
    )
)]
pub async fn validate(
    Guard(guard): Guard,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = payload?;
    let (_, valid) = off_runtime(guard, move |guard| guard.validate(&request.credentials)).await?;
    let valid = valid?;
    Ok(Json(ValidateResponse { valid }))
}

/// End the session named by the `Authorization` header.
///
/// Succeeds whether or not the token was live.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("session_token" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 503, description = "Session store unavailable"),
    )
)]
pub async fn logout(Guard(mut guard): Guard) -> Result<StatusCode, AuthError> {
    // resolve first so the logout notification names the user
    guard.user()?;
    guard.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Describe the current session.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    tag = "Auth",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No live session"),
    )
)]
pub async fn session(Guard(mut guard): Guard) -> Result<Json<SessionResponse>, AuthError> {
    let user_id = guard.authenticate()?.id.clone();
    let token = guard.token().map(str::to_owned).unwrap_or_default();
    let expires_on = guard.expiration()?;

    Ok(Json(SessionResponse {
        user_id,
        token,
        expires_on,
    }))
}
