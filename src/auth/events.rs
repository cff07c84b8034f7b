// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication notifications.
//!
//! The guard reports `Attempting`, `Login` and `Logout` to an optional
//! [`EventSink`]. Delivery is best-effort: a sink error is logged and
//! dropped, it never changes the outcome of the authentication call.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Credentials, UserId};

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEventKind {
    /// Credentials are about to be checked.
    Attempting {
        credentials: Credentials,
        remember: bool,
        login: bool,
    },
    /// A session was established.
    Login { user_id: UserId, remember: bool },
    /// A session was ended. `user_id` is known only if the user had been
    /// resolved on that guard.
    Logout { user_id: Option<UserId> },
}

impl AuthEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEventKind::Attempting { .. } => "attempting",
            AuthEventKind::Login { .. } => "login",
            AuthEventKind::Logout { .. } => "logout",
        }
    }
}

/// A notification plus its metadata.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
    /// Name of the guard that emitted it.
    pub guard: String,
    pub kind: AuthEventKind,
}

impl AuthEvent {
    pub fn new(guard: impl Into<String>, occurred_at: DateTime<Utc>, kind: AuthEventKind) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            occurred_at,
            guard: guard.into(),
            kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("sink lock poisoned")]
    LockPoisoned,

    #[error("{0}")]
    Rejected(String),
}

/// Receiver of authentication notifications.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: &AuthEvent) -> Result<(), SinkError>;
}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn dispatch(&self, event: &AuthEvent) -> Result<(), SinkError> {
        match &event.kind {
            AuthEventKind::Attempting { credentials, login, .. } => tracing::info!(
                event_id = %event.event_id,
                guard = %event.guard,
                credentials = ?credentials,
                login,
                "Authentication attempt"
            ),
            AuthEventKind::Login { user_id, .. } => tracing::info!(
                event_id = %event.event_id,
                guard = %event.guard,
                user_id = %user_id,
                "Session established"
            ),
            AuthEventKind::Logout { user_id } => tracing::info!(
                event_id = %event.event_id,
                guard = %event.guard,
                user_id = user_id.as_ref().map(UserId::as_str),
                "Session ended"
            ),
        }
        Ok(())
    }
}

/// JSON line written by [`AuditLogSink`].
#[derive(Debug, Serialize)]
struct AuditLine<'a> {
    event_id: &'a str,
    timestamp: DateTime<Utc>,
    guard: &'a str,
    event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Appends one redacted JSON line per event to an audit file.
pub struct AuditLogSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn line(event: &AuthEvent) -> AuditLine<'_> {
        let (user_id, details) = match &event.kind {
            AuthEventKind::Attempting {
                credentials,
                remember,
                login,
            } => (
                None,
                Some(serde_json::json!({
                    "credentials": credentials.redacted(),
                    "remember": remember,
                    "login": login,
                })),
            ),
            AuthEventKind::Login { user_id, remember } => (
                Some(user_id),
                Some(serde_json::json!({ "remember": remember })),
            ),
            AuthEventKind::Logout { user_id } => (user_id.as_ref(), None),
        };
        AuditLine {
            event_id: &event.event_id,
            timestamp: event.occurred_at,
            guard: &event.guard,
            event_type: event.kind.name(),
            user_id,
            details,
        }
    }
}

impl EventSink for AuditLogSink {
    fn dispatch(&self, event: &AuthEvent) -> Result<(), SinkError> {
        let mut json = serde_json::to_vec(&Self::line(event))?;
        json.push(b'\n');

        let _guard = self.lock.lock().map_err(|_| SinkError::LockPoisoned)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&json)?;
        Ok(())
    }
}

/// Delivers each event to several sinks.
///
/// Every sink sees every event; the first failure is reported after all of
/// them have run.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn dispatch(&self, event: &AuthEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.dispatch(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every event it receives.
    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<AuthEvent>>,
    }

    impl RecordingSink {
        pub fn names(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.kind.name())
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn dispatch(&self, event: &AuthEvent) -> Result<(), SinkError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Fails every delivery.
    pub struct FailingSink;

    impl EventSink for FailingSink {
        fn dispatch(&self, _event: &AuthEvent) -> Result<(), SinkError> {
            Err(SinkError::Rejected("listener offline".into()))
        }
    }
}
