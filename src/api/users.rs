// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, UserId};
use crate::storage::DirectoryUser;

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID
    pub user_id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<DirectoryUser> for UserMeResponse {
    fn from(user: DirectoryUser) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            display_name: user.display_name,
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - missing, unknown or expired token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_me_response_hides_password_hash() {
        let user = DirectoryUser {
            id: UserId::from("user_123"),
            username: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        };

        let response: UserMeResponse = user.into();
        assert_eq!(response.user_id, UserId::from("user_123"));
        assert_eq!(response.display_name.as_deref(), Some("Alice"));

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("argon2"));
    }
}
