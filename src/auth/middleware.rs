// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session middleware for Axum.
//!
//! Applies authentication to a whole router subtree. The resolved user is
//! placed in request extensions, where the [`Auth`](super::Auth) extractor
//! picks it up without a second store lookup.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/users/me", get(users::get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_session,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AuthError;
use crate::state::AppState;

/// Reject requests without a live session.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut guard = state.guards.guard(request.headers().clone());

    let user = match guard.authenticate() {
        Ok(user) => user.clone(),
        Err(e) => return AuthError::from(e).into_response(),
    };

    tracing::debug!(user_id = %user.id, path = %request.uri().path(), "Session resolved");
    request.extensions_mut().insert(user);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Auth, Credentials};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn whoami(Auth(user): Auth) -> String {
        user.username
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_session,
            ))
            .with_state(state)
    }

    fn login(state: &AppState) -> String {
        state.directory().register("5", "frank", "pw").unwrap();
        let mut guard = state.guards.detached();
        let creds = Credentials::new()
            .with("username", "frank")
            .with("password", "pw");
        assert!(guard.attempt(&creds, true).unwrap());
        guard.token().unwrap().to_string()
    }

    #[tokio::test]
    async fn passes_live_session_through() {
        let state = AppState::default();
        let token = login(&state);

        let response = app(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"frank");
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let response = app(AppState::default())
            .oneshot(HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
