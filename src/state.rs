// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::GuardFactory;
use crate::config::GuardConfig;
use crate::storage::{InMemorySessionStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub guards: GuardFactory<UserDirectory>,
}

impl AppState {
    pub fn new(guards: GuardFactory<UserDirectory>) -> Self {
        Self { guards }
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        self.guards.provider()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GuardFactory::new(
            Arc::new(UserDirectory::new()),
            Arc::new(InMemorySessionStore::default()),
            GuardConfig::default(),
        ))
    }
}
