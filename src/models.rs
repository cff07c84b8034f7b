// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the session endpoints. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! Tokens appear in responses only; requests carry them in the raw
//! `Authorization` header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Credentials, UserId};

// =============================================================================
// Login
// =============================================================================

/// Body of `POST /v1/auth/login` and `POST /v1/auth/validate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Field map handed to the user provider, e.g. `username` + `password`.
    pub credentials: Credentials,
}

/// Issued session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Opaque token to send back verbatim in `Authorization`.
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
}

// =============================================================================
// Session
// =============================================================================

/// Session the request is authenticated with.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: UserId,
    pub token: String,
    /// Read from the store, so it reflects the live record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<DateTime<Utc>>,
}
