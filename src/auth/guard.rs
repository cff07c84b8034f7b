// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request session guard.
//!
//! A [`TokenGuard`] is built for one request. It reads the raw
//! `Authorization` header, looks the token up in the session store and asks
//! the user provider for the user the session belongs to. On login it mints
//! a fresh token and writes `{ user_id, expires_on }` under
//! `"auth:" + token` with a TTL equal to the session lifetime.
//!
//! ## State
//!
//! - `user()` is memoized: the store is hit at most once per guard, whether
//!   or not a user was found. [`TokenGuard::reset_user`] clears the memo.
//! - [`TokenGuard::logout`] is terminal. Afterwards `user()` is always
//!   `None` and `login()` fails with [`GuardError::LoggedOut`]; build a new
//!   guard for a new session.
//!
//! ## Failures
//!
//! Rejection is never an error: a missing header, unknown or expired token,
//! or bad credentials come back as `None` / `false`. Store and provider
//! failures propagate as [`GuardError`]. Notification failures are logged
//! and dropped.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::events::{AuthEvent, AuthEventKind, EventSink};
use super::request::RequestAccessor;
use super::token::{session_key, RandomTokenSource, TokenError, TokenSource};
use super::{Authenticatable, Credentials, UserId, UserProvider};
use crate::config::GuardConfig;
use crate::storage::{Clock, SessionRecord, SessionStore, StoreError, SystemClock};

/// Name used in events when none is configured.
pub const DEFAULT_GUARD_NAME: &str = "api";

/// Candidates tried before token generation gives up.
pub const MAX_TOKEN_ATTEMPTS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("session store error: {0}")]
    Store(#[from] StoreError),

    #[error("user provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("token generation failed: {0}")]
    Token(#[from] TokenError),

    #[error("guard has been logged out; a new guard is required to start a session")]
    LoggedOut,

    #[error("unauthenticated")]
    Unauthenticated,
}

impl GuardError {
    pub fn provider<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GuardError::Provider(Box::new(error))
    }
}

pub type GuardResult<T> = Result<T, GuardError>;

pub struct TokenGuard<P: UserProvider> {
    name: String,
    provider: Arc<P>,
    /// Source of request headers. Replaceable through [`TokenGuard::set_request`]
    /// only for hosts that build the guard before the request exists.
    request: Box<dyn RequestAccessor>,
    store: Arc<dyn SessionStore>,
    events: Option<Arc<dyn EventSink>>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
    config: GuardConfig,

    token: Option<String>,
    user: Option<P::User>,
    /// Whether `user` holds the outcome of a lookup (including "nobody").
    resolved: bool,
    last_attempted: Option<P::User>,
    logged_out: bool,
}

impl<P: UserProvider> TokenGuard<P> {
    /// Build a guard with explicit collaborators and default clock, token
    /// source and no event sink.
    pub fn new(
        provider: Arc<P>,
        request: impl RequestAccessor + 'static,
        store: Arc<dyn SessionStore>,
        config: GuardConfig,
    ) -> Self {
        Self {
            name: DEFAULT_GUARD_NAME.to_string(),
            provider,
            request: Box::new(request),
            store,
            events: None,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(RandomTokenSource::new()),
            config,
            token: None,
            user: None,
            resolved: false,
            last_attempted: None,
            logged_out: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_events(mut self, events: Option<Arc<dyn EventSink>>) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// The user the current request is authenticated as.
    pub fn user(&mut self) -> GuardResult<Option<&P::User>> {
        if self.logged_out {
            return Ok(None);
        }
        if !self.resolved {
            self.user = self.resolve_from_request()?;
            self.resolved = true;
        }
        Ok(self.user.as_ref())
    }

    fn resolve_from_request(&mut self) -> GuardResult<Option<P::User>> {
        self.token = self.request_token();

        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let Some(record) = self.store.get(&session_key(token))? else {
            debug!(guard = %self.name, "No live session for presented token");
            return Ok(None);
        };

        let user = self
            .provider
            .retrieve_by_id(&record.user_id)
            .map_err(GuardError::provider)?;
        if user.is_none() {
            debug!(guard = %self.name, user_id = %record.user_id, "Session refers to an unknown user");
        }
        Ok(user)
    }

    /// Whether the request is authenticated.
    pub fn check(&mut self) -> GuardResult<bool> {
        Ok(self.user()?.is_some())
    }

    /// Whether the request is anonymous.
    pub fn guest(&mut self) -> GuardResult<bool> {
        Ok(!self.check()?)
    }

    /// Identifier of the authenticated user.
    pub fn id(&mut self) -> GuardResult<Option<UserId>> {
        Ok(self.user()?.map(Authenticatable::auth_identifier))
    }

    /// The authenticated user, or [`GuardError::Unauthenticated`].
    pub fn authenticate(&mut self) -> GuardResult<&P::User> {
        self.user()?.ok_or(GuardError::Unauthenticated)
    }

    /// Whether a user is memoized, without resolving one.
    pub fn has_user(&self) -> bool {
        !self.logged_out && self.user.is_some()
    }

    /// Memoize a user without touching the store.
    pub fn set_user(&mut self, user: P::User) -> &mut Self {
        self.user = Some(user);
        self.resolved = true;
        self
    }

    /// Forget the memoized user so the next `user()` resolves again.
    pub fn reset_user(&mut self) {
        self.user = None;
        self.resolved = false;
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Check credentials without establishing a session.
    pub fn validate(&mut self, credentials: &Credentials) -> GuardResult<bool> {
        self.attempt(credentials, false)
    }

    /// Check credentials and, if `login` is set, establish a session.
    ///
    /// Returns whether the credentials were valid.
    pub fn attempt(&mut self, credentials: &Credentials, login: bool) -> GuardResult<bool> {
        self.fire(AuthEventKind::Attempting {
            credentials: credentials.clone(),
            remember: false,
            login,
        });

        let candidate = self
            .provider
            .retrieve_by_credentials(credentials)
            .map_err(GuardError::provider)?;
        self.last_attempted = candidate.clone();

        let Some(user) = candidate else {
            debug!(guard = %self.name, "No user matches the supplied credentials");
            return Ok(false);
        };

        if !self
            .provider
            .validate_credentials(&user, credentials)
            .map_err(GuardError::provider)?
        {
            debug!(guard = %self.name, user_id = %user.auth_identifier(), "Credentials rejected");
            return Ok(false);
        }

        if login {
            self.login(user)?;
        }
        Ok(true)
    }

    /// Candidate user returned by the provider on the latest attempt.
    pub fn last_attempted(&self) -> Option<&P::User> {
        self.last_attempted.as_ref()
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Establish a session for `user` and return its token.
    pub fn login(&mut self, user: P::User) -> GuardResult<String> {
        if self.logged_out {
            return Err(GuardError::LoggedOut);
        }

        let user_id = user.auth_identifier();
        let expires_on = self.clock.now() + self.config.lifetime();
        let token = self.generate_token()?;

        self.store.put(
            &session_key(&token),
            SessionRecord::new(user_id.clone(), expires_on),
            self.config.ttl(),
        )?;
        self.token = Some(token.clone());

        self.fire(AuthEventKind::Login {
            user_id,
            remember: false,
        });

        self.set_user(user);
        Ok(token)
    }

    /// End the current session. The guard stays logged out for good.
    pub fn logout(&mut self) -> GuardResult<()> {
        if let Some(token) = self.current_token() {
            self.store.forget(&session_key(&token))?;
        }

        let user_id = self.user.as_ref().map(Authenticatable::auth_identifier);
        self.fire(AuthEventKind::Logout { user_id });

        self.user = None;
        self.resolved = false;
        self.logged_out = true;
        Ok(())
    }

    pub fn is_logged_out(&self) -> bool {
        self.logged_out
    }

    /// Token of the current request or of the session just established.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Expiry of the current session, read fresh from the store.
    pub fn expiration(&self) -> GuardResult<Option<DateTime<Utc>>> {
        let Some(token) = self.current_token() else {
            return Ok(None);
        };
        Ok(self
            .store
            .get(&session_key(&token))?
            .map(|record| record.expires_on))
    }

    /// Swap the request the guard reads headers from.
    pub fn set_request(&mut self, request: impl RequestAccessor + 'static) -> &mut Self {
        self.request = Box::new(request);
        self
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn request_token(&self) -> Option<String> {
        self.request.header(AUTHORIZATION.as_str())
    }

    /// Known token, else the one on the request; empty means none.
    fn current_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| self.request_token())
            .filter(|t| !t.is_empty())
    }

    fn generate_token(&self) -> GuardResult<String> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let candidate = self.tokens.next_token()?;
            if !self.store.has(&session_key(&candidate))? {
                return Ok(candidate);
            }
            warn!(guard = %self.name, "Generated token collides with a live session, retrying");
        }
        Err(TokenError::Exhausted(MAX_TOKEN_ATTEMPTS).into())
    }

    fn fire(&self, kind: AuthEventKind) {
        let Some(events) = &self.events else {
            return;
        };
        let event = AuthEvent::new(self.name.clone(), self.clock.now(), kind);
        if let Err(e) = events.dispatch(&event) {
            warn!(
                guard = %self.name,
                event = event.kind.name(),
                error = %e,
                "Auth event delivery failed"
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{HeaderMap, HeaderValue};

    use super::testing::*;
    use super::*;
    use crate::auth::events::testing::{FailingSink, RecordingSink};
    use crate::auth::request::EmptyRequest;
    use crate::storage::{InMemorySessionStore, ManualClock};

    struct Fixture {
        provider: Arc<TestProvider>,
        store: Arc<CountingStore>,
        clock: ManualClock,
        events: Arc<RecordingSink>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = ManualClock::default();
            Self {
                provider: Arc::new(TestProvider::with_users(&[
                    ("1", "alice", "correct"),
                    ("2", "bob", "builder"),
                ])),
                store: Arc::new(CountingStore::new(InMemorySessionStore::with_clock(
                    100,
                    Arc::new(clock.clone()),
                ))),
                clock,
                events: Arc::new(RecordingSink::default()),
            }
        }

        fn guard_with(&self, request: impl RequestAccessor + 'static) -> TokenGuard<TestProvider> {
            TokenGuard::new(
                self.provider.clone(),
                request,
                self.store.clone(),
                GuardConfig::new(60),
            )
            .with_clock(Arc::new(self.clock.clone()))
            .with_events(Some(self.events.clone() as Arc<dyn EventSink>))
        }

        fn guard(&self) -> TokenGuard<TestProvider> {
            self.guard_with(EmptyRequest)
        }

        fn guard_for(&self, token: &str) -> TokenGuard<TestProvider> {
            self.guard_with(bearer(token))
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        headers
    }

    fn creds(user: &str, pass: &str) -> Credentials {
        Credentials::new().with("user", user).with("pass", pass)
    }

    #[test]
    fn valid_login_memoizes_user_without_store_lookup() {
        let fx = Fixture::new();
        let mut guard = fx.guard();

        assert!(guard.attempt(&creds("alice", "correct"), true).unwrap());

        let user = guard.user().unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(fx.store.gets(), 0);
        assert!(guard.token().is_some());
        assert_eq!(guard.last_attempted().unwrap().username, "alice");
    }

    #[test]
    fn wrong_password_or_unknown_user_writes_nothing() {
        let fx = Fixture::new();
        let mut guard = fx.guard();

        assert!(!guard.attempt(&creds("alice", "wrong"), true).unwrap());
        assert!(!guard.attempt(&creds("mallory", "correct"), true).unwrap());
        assert!(!guard.attempt(&Credentials::new(), true).unwrap());

        assert_eq!(fx.store.puts(), 0);
        assert!(fx.store.inner.is_empty());
        assert!(guard.token().is_none());
        assert!(guard.last_attempted().is_none());
    }

    #[test]
    fn validate_checks_without_session() {
        let fx = Fixture::new();
        let mut guard = fx.guard();

        assert!(guard.validate(&creds("bob", "builder")).unwrap());
        assert!(!guard.validate(&creds("bob", "nope")).unwrap());

        assert_eq!(fx.store.puts(), 0);
        assert!(!guard.has_user());
        let events = fx.events.events.lock().unwrap();
        assert!(events.iter().all(|e| matches!(
            e.kind,
            AuthEventKind::Attempting { login: false, .. }
        )));
    }

    #[test]
    fn login_writes_one_record_with_lifetime_expiry() {
        let fx = Fixture::new();
        let mut guard = fx.guard();
        let user = fx.provider.retrieve_by_id(&UserId::from("1")).unwrap().unwrap();

        let token = guard.login(user).unwrap();

        assert_eq!(fx.store.puts(), 1);
        assert_eq!(fx.store.inner.len(), 1);
        let record = fx.store.inner.get(&session_key(&token)).unwrap().unwrap();
        assert_eq!(record.user_id, UserId::from("1"));
        assert_eq!(record.expires_on, fx.clock.now() + chrono::Duration::minutes(60));
        assert_eq!(guard.expiration().unwrap(), Some(record.expires_on));
    }

    #[test]
    fn token_round_trips_on_fresh_guard() {
        let fx = Fixture::new();
        let mut first = fx.guard();
        assert!(first.attempt(&creds("alice", "correct"), true).unwrap());
        let token = first.token().unwrap().to_string();

        let mut second = fx.guard_for(&token);
        let user = second.user().unwrap().unwrap();
        assert_eq!(user.id, UserId::from("1"));
        assert_eq!(second.token(), Some(token.as_str()));
        assert!(second.check().unwrap());
        assert_eq!(second.id().unwrap(), Some(UserId::from("1")));
    }

    #[test]
    fn logout_forgets_record_and_stays_logged_out() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        login.attempt(&creds("alice", "correct"), true).unwrap();
        let token = login.token().unwrap().to_string();

        let mut guard = fx.guard_for(&token);
        assert!(guard.user().unwrap().is_some());
        guard.logout().unwrap();

        assert!(!fx.store.inner.has(&session_key(&token)).unwrap());
        assert!(guard.user().unwrap().is_none());
        assert!(guard.is_logged_out());

        // a valid token injected afterwards is still ignored
        let mut other = fx.guard();
        other.attempt(&creds("bob", "builder"), true).unwrap();
        let live = other.token().unwrap().to_string();
        guard.set_request(bearer(&live));
        guard.reset_user();
        assert!(guard.user().unwrap().is_none());
        assert!(!guard.has_user());
    }

    #[test]
    fn login_after_logout_is_rejected() {
        let fx = Fixture::new();
        let mut guard = fx.guard();
        guard.logout().unwrap();

        let user = fx.provider.retrieve_by_id(&UserId::from("1")).unwrap().unwrap();
        assert!(matches!(guard.login(user), Err(GuardError::LoggedOut)));
        assert!(matches!(
            guard.attempt(&creds("alice", "correct"), true),
            Err(GuardError::LoggedOut)
        ));
        // validation alone is still allowed
        assert!(guard.validate(&creds("alice", "correct")).unwrap());
        assert_eq!(fx.store.puts(), 0);
    }

    #[test]
    fn user_hits_store_at_most_once() {
        let fx = Fixture::new();
        let mut guard = fx.guard_for("not-a-session");

        for _ in 0..3 {
            assert!(guard.user().unwrap().is_none());
        }
        assert_eq!(fx.store.gets(), 1);

        guard.reset_user();
        assert!(guard.user().unwrap().is_none());
        assert_eq!(fx.store.gets(), 2);
    }

    #[test]
    fn missing_or_empty_header_skips_store() {
        let fx = Fixture::new();

        assert!(fx.guard().user().unwrap().is_none());
        assert!(fx.guard_for("").user().unwrap().is_none());
        assert!(fx.guard().guest().unwrap());

        assert_eq!(fx.store.gets(), 0);
    }

    #[test]
    fn header_is_used_verbatim() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        login.attempt(&creds("alice", "correct"), true).unwrap();
        let token = login.token().unwrap().to_string();

        let mut prefixed = fx.guard_for(&format!("Bearer {token}"));
        assert!(prefixed.user().unwrap().is_none());
    }

    #[test]
    fn deleted_account_resolves_to_none() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        login.attempt(&creds("bob", "builder"), true).unwrap();
        let token = login.token().unwrap().to_string();

        fx.provider.remove("2");

        let mut guard = fx.guard_for(&token);
        assert!(guard.user().unwrap().is_none());
        assert!(matches!(guard.authenticate(), Err(GuardError::Unauthenticated)));
    }

    #[test]
    fn expired_record_resolves_to_none() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        login.attempt(&creds("alice", "correct"), true).unwrap();
        let token = login.token().unwrap().to_string();

        fx.clock.advance(chrono::Duration::minutes(60));

        let mut guard = fx.guard_for(&token);
        assert!(guard.user().unwrap().is_none());
        assert_eq!(guard.expiration().unwrap(), None);
    }

    #[test]
    fn alice_session_lasts_sixty_minutes() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        assert!(login.attempt(&creds("alice", "correct"), true).unwrap());
        let t1 = login.token().unwrap().to_string();

        fx.clock.advance(chrono::Duration::minutes(59));
        let mut within = fx.guard_for(&t1);
        assert_eq!(within.user().unwrap().unwrap().username, "alice");

        fx.clock.advance(chrono::Duration::minutes(2));
        let mut after = fx.guard_for(&t1);
        assert!(after.user().unwrap().is_none());
    }

    #[test]
    fn sequential_logins_are_independent() {
        let fx = Fixture::new();
        let mut a = fx.guard();
        let mut b = fx.guard();
        a.attempt(&creds("alice", "correct"), true).unwrap();
        b.attempt(&creds("alice", "correct"), true).unwrap();
        let t1 = a.token().unwrap().to_string();
        let t2 = b.token().unwrap().to_string();
        assert_ne!(t1, t2);

        let mut revoke = fx.guard_for(&t1);
        revoke.logout().unwrap();

        assert!(fx.guard_for(&t1).user().unwrap().is_none());
        assert_eq!(fx.guard_for(&t2).user().unwrap().unwrap().username, "alice");
    }

    #[test]
    fn logout_without_token_does_not_touch_store() {
        let fx = Fixture::new();
        let mut guard = fx.guard();
        guard.logout().unwrap();
        assert_eq!(fx.store.forgets(), 0);
        assert_eq!(fx.events.names(), vec!["logout"]);
    }

    #[test]
    fn events_follow_session_lifecycle() {
        let fx = Fixture::new();
        let mut guard = fx.guard();
        guard.attempt(&creds("alice", "correct"), true).unwrap();
        guard.logout().unwrap();

        assert_eq!(fx.events.names(), vec!["attempting", "login", "logout"]);
        let events = fx.events.events.lock().unwrap();
        assert!(events.iter().all(|e| e.guard == DEFAULT_GUARD_NAME));
        assert_eq!(
            events[1].kind,
            AuthEventKind::Login {
                user_id: UserId::from("1"),
                remember: false
            }
        );
        assert_eq!(
            events[2].kind,
            AuthEventKind::Logout {
                user_id: Some(UserId::from("1"))
            }
        );
    }

    #[test]
    fn failing_sink_does_not_break_authentication() {
        let fx = Fixture::new();
        let mut guard = fx
            .guard()
            .with_events(Some(Arc::new(FailingSink) as Arc<dyn EventSink>));

        assert!(guard.attempt(&creds("alice", "correct"), true).unwrap());
        assert!(guard.user().unwrap().is_some());
        guard.logout().unwrap();
        assert!(guard.user().unwrap().is_none());
    }

    #[test]
    fn colliding_candidate_is_skipped() {
        let fx = Fixture::new();
        fx.store
            .inner
            .put(
                &session_key("taken"),
                SessionRecord::new(UserId::from("2"), fx.clock.now()),
                Duration::from_secs(3600),
            )
            .unwrap();

        let mut guard = fx
            .guard()
            .with_token_source(Arc::new(ScriptedTokens::new(&["taken", "fresh"])));
        let user = fx.provider.retrieve_by_id(&UserId::from("1")).unwrap().unwrap();

        assert_eq!(guard.login(user).unwrap(), "fresh");
        let taken = fx.store.inner.get(&session_key("taken")).unwrap().unwrap();
        assert_eq!(taken.user_id, UserId::from("2"));
    }

    #[test]
    fn token_generation_gives_up_eventually() {
        let fx = Fixture::new();
        fx.store
            .inner
            .put(
                &session_key("same"),
                SessionRecord::new(UserId::from("2"), fx.clock.now()),
                Duration::from_secs(3600),
            )
            .unwrap();
        let script = vec!["same"; MAX_TOKEN_ATTEMPTS];
        let mut guard = fx
            .guard()
            .with_token_source(Arc::new(ScriptedTokens::new(&script)));
        let user = fx.provider.retrieve_by_id(&UserId::from("1")).unwrap().unwrap();

        assert!(matches!(
            guard.login(user),
            Err(GuardError::Token(TokenError::Exhausted(MAX_TOKEN_ATTEMPTS)))
        ));
        assert_eq!(fx.store.puts(), 0);
    }

    #[test]
    fn store_failure_propagates() {
        let provider = Arc::new(TestProvider::with_users(&[("1", "alice", "correct")]));
        let mut guard = TokenGuard::new(
            provider.clone(),
            bearer("tok"),
            Arc::new(DownStore),
            GuardConfig::default(),
        );
        assert!(matches!(guard.user(), Err(GuardError::Store(_))));

        let mut login = TokenGuard::new(
            provider,
            EmptyRequest,
            Arc::new(DownStore),
            GuardConfig::default(),
        );
        assert!(matches!(
            login.attempt(&creds("alice", "correct"), true),
            Err(GuardError::Store(_))
        ));
        assert!(!login.has_user());
    }

    #[test]
    fn other_logins_never_end_a_live_session() {
        let fx = Fixture::new();
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::with_clock(
            2,
            Arc::new(fx.clock.clone()),
        ));
        let guard_with = |request: HeaderMap| {
            TokenGuard::new(fx.provider.clone(), request, store.clone(), GuardConfig::new(60))
                .with_clock(Arc::new(fx.clock.clone()))
        };

        let mut alice = guard_with(HeaderMap::new());
        assert!(alice.attempt(&creds("alice", "correct"), true).unwrap());
        let alice_token = alice.token().unwrap().to_string();

        let mut bob = guard_with(HeaderMap::new());
        assert!(bob.attempt(&creds("bob", "builder"), true).unwrap());
        let mut bob_again = guard_with(HeaderMap::new());
        assert!(matches!(
            bob_again.attempt(&creds("bob", "builder"), true),
            Err(GuardError::Store(StoreError::Full(_)))
        ));
        assert!(!bob_again.has_user());

        let mut fresh = guard_with(bearer(&alice_token));
        assert_eq!(fresh.user().unwrap().unwrap().username, "alice");
    }

    #[test]
    fn provider_failure_propagates() {
        let fx = Fixture::new();
        let provider = Arc::new(TestProvider {
            offline: true,
            ..TestProvider::default()
        });
        let mut guard = TokenGuard::new(
            provider,
            EmptyRequest,
            fx.store.clone(),
            GuardConfig::default(),
        );

        let err = guard.attempt(&creds("alice", "correct"), true).unwrap_err();
        assert!(matches!(err, GuardError::Provider(_)));
        assert_eq!(err.to_string(), "user provider error: user backend offline");
    }

    #[test]
    fn set_request_rebinds_header_source() {
        let fx = Fixture::new();
        let mut login = fx.guard();
        login.attempt(&creds("alice", "correct"), true).unwrap();
        let token = login.token().unwrap().to_string();

        let mut guard = fx.guard();
        guard.set_request(bearer(&token));
        assert_eq!(guard.user().unwrap().unwrap().username, "alice");
    }

    #[test]
    fn expiration_without_token_is_none() {
        let fx = Fixture::new();
        assert_eq!(fx.guard().expiration().unwrap(), None);
    }
}
