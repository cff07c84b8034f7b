// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Reaper
//!
//! Background task that periodically sweeps expired session records out of
//! the store. Reads already treat expired records as absent; the sweep only
//! reclaims space for tokens that are never presented again.
//!
//! ## Shutdown
//!
//! Stops when its `tokio_util::sync::CancellationToken` is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_PURGE_INTERVAL;
use crate::storage::SessionStore;

pub struct SessionReaper {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl SessionReaper {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_PURGE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(reaper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            backend = self.store.backend(),
            interval_secs = self.interval.as_secs(),
            "Session reaper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session reaper shutting down");
                return;
            }

            self.sweep();

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session reaper shutting down");
                    return;
                }
            }
        }
    }

    /// One sweep; returns how many records were removed.
    pub fn sweep(&self) -> usize {
        match self.store.purge_expired() {
            Ok(0) => 0,
            Ok(removed) => {
                debug!(removed, "Purged expired sessions");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Session purge failed, will retry");
                0
            }
        }
    }
}
