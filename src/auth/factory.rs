// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared collaborators for building one guard per request.

use std::sync::Arc;

use super::events::EventSink;
use super::guard::{TokenGuard, DEFAULT_GUARD_NAME};
use super::request::{EmptyRequest, RequestAccessor};
use super::token::{RandomTokenSource, TokenSource};
use super::UserProvider;
use crate::config::GuardConfig;
use crate::storage::{Clock, SessionStore, SystemClock};

/// Holds the provider, store, sink and configuration shared by every guard.
///
/// Cloning is cheap; every collaborator sits behind an `Arc`.
pub struct GuardFactory<P: UserProvider> {
    name: Arc<str>,
    provider: Arc<P>,
    store: Arc<dyn SessionStore>,
    events: Option<Arc<dyn EventSink>>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
    config: GuardConfig,
}

// Manual impl: `P` itself need not be `Clone`.
impl<P: UserProvider> Clone for GuardFactory<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            provider: self.provider.clone(),
            store: self.store.clone(),
            events: self.events.clone(),
            clock: self.clock.clone(),
            tokens: self.tokens.clone(),
            config: self.config,
        }
    }
}

impl<P: UserProvider> GuardFactory<P> {
    pub fn new(provider: Arc<P>, store: Arc<dyn SessionStore>, config: GuardConfig) -> Self {
        Self {
            name: Arc::from(DEFAULT_GUARD_NAME),
            provider,
            store,
            events: None,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(RandomTokenSource::new()),
            config,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
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

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Arc::from(name);
        self
    }

    /// Guard bound to `request`.
    pub fn guard(&self, request: impl RequestAccessor + 'static) -> TokenGuard<P> {
        TokenGuard::new(
            self.provider.clone(),
            request,
            self.store.clone(),
            self.config,
        )
        .with_name(&*self.name)
        .with_events(self.events.clone())
        .with_clock(self.clock.clone())
        .with_token_source(self.tokens.clone())
    }

    /// Guard with no request yet; bind one later with
    /// [`TokenGuard::set_request`].
    pub fn detached(&self) -> TokenGuard<P> {
        self.guard(EmptyRequest)
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}
