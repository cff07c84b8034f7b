// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use token_guard::api::router;
use token_guard::auth::events::{AuditLogSink, FanoutSink, TracingSink};
use token_guard::auth::GuardFactory;
use token_guard::config::{GuardConfig, ServerConfig, StoreBackend, DEFAULT_LOG_FILTER};
use token_guard::reaper::SessionReaper;
use token_guard::state::AppState;
use token_guard::storage::{InMemorySessionStore, RedbSessionStore, SessionStore, UserDirectory};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(config.json_logs);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    let guard_config = GuardConfig::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.store {
        StoreBackend::Memory { capacity } => Arc::new(InMemorySessionStore::new(*capacity)),
        StoreBackend::Redb { path } => Arc::new(RedbSessionStore::open(path)?),
    };

    let directory = match &config.users_file {
        Some(path) if path.exists() => UserDirectory::load(path)?,
        Some(path) => {
            warn!(path = %path.display(), "Users file not found, starting with an empty directory");
            UserDirectory::new()
        }
        None => UserDirectory::new(),
    };

    if let Some((username, password)) = &config.seed_user {
        match directory.seed(username, password, config.users_file.as_deref())? {
            Some(user) => info!(user_id = %user.id, username = %user.username, "Seeded user"),
            None => info!(username = %username, "Seed user already present"),
        }
    }

    let mut events = FanoutSink::new().with(Arc::new(TracingSink));
    if let Some(path) = &config.audit_log {
        events = events.with(Arc::new(AuditLogSink::new(path)));
    }

    let guards = GuardFactory::new(Arc::new(directory), store.clone(), guard_config)
        .with_events(Arc::new(events));
    let app = router(AppState::new(guards));

    let shutdown = CancellationToken::new();
    tokio::spawn(
        SessionReaper::new(store.clone())
            .with_interval(config.purge_interval)
            .run(shutdown.clone()),
    );

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), shutdown.clone()));

    info!(
        addr = %config.bind_addr,
        backend = store.backend(),
        session_lifetime_minutes = guard_config.session_lifetime_minutes,
        tls = config.tls.is_some(),
        "Token guard server listening (docs at /docs)"
    );

    match &config.tls {
        Some((cert, key)) => {
            // Install the ring crypto provider for rustls before any TLS setup
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "failed to install rustls crypto provider")?;
            let tls_config = RustlsConfig::from_pem_file(cert, key).await?;
            axum_server::bind_rustls(config.bind_addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(config.bind_addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle<std::net::SocketAddr>, shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
