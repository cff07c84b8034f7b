// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! typed configuration loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SESSION_LIFETIME` | Session lifetime in minutes | `120` |
//! | `SESSION_STORE` | Token store backend (`memory` or `redb`) | `memory` |
//! | `SESSION_DB_PATH` | redb file for the persistent store | `data/sessions.redb` |
//! | `SESSION_CACHE_CAPACITY` | Max sessions held by the memory store | `100000` |
//! | `SESSION_PURGE_INTERVAL_SECS` | Expired-session sweep interval | `300` |
//! | `USERS_FILE` | JSON user directory | none (empty directory) |
//! | `SEED_USER` | `username:password` registered at startup | none |
//! | `AUDIT_LOG_PATH` | JSON-lines file for auth events | none (tracing only) |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | none |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const SESSION_LIFETIME_ENV: &str = "SESSION_LIFETIME";
pub const SESSION_STORE_ENV: &str = "SESSION_STORE";
pub const SESSION_DB_PATH_ENV: &str = "SESSION_DB_PATH";
pub const SESSION_CACHE_CAPACITY_ENV: &str = "SESSION_CACHE_CAPACITY";
pub const SESSION_PURGE_INTERVAL_ENV: &str = "SESSION_PURGE_INTERVAL_SECS";
pub const USERS_FILE_ENV: &str = "USERS_FILE";
pub const SEED_USER_ENV: &str = "SEED_USER";
pub const AUDIT_LOG_PATH_ENV: &str = "AUDIT_LOG_PATH";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default session lifetime in minutes.
pub const DEFAULT_SESSION_LIFETIME_MINUTES: u32 = 120;
pub const DEFAULT_SESSION_DB_PATH: &str = "data/sessions.redb";
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Settings the guard reads when it establishes a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Session lifetime in minutes; also the store TTL.
    pub session_lifetime_minutes: u32,
}

impl GuardConfig {
    pub fn new(session_lifetime_minutes: u32) -> Self {
        Self {
            session_lifetime_minutes,
        }
    }

    /// Offset added to "now" to get a record's `expires_on`.
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_lifetime_minutes))
    }

    /// TTL handed to the token store.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.session_lifetime_minutes) * 60)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let minutes = parse_or(
            &lookup,
            SESSION_LIFETIME_ENV,
            DEFAULT_SESSION_LIFETIME_MINUTES,
            "a positive number of minutes",
        )?;
        if minutes == 0 {
            return Err(ConfigError::Invalid {
                name: SESSION_LIFETIME_ENV,
                value: "0".to_string(),
                expected: "a positive number of minutes",
            });
        }
        Ok(Self::new(minutes))
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_LIFETIME_MINUTES)
    }
}

/// Token store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory { capacity: usize },
    Redb { path: PathBuf },
}

/// Everything the service binary needs besides the guard settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub purge_interval: Duration,
    pub users_file: Option<PathBuf>,
    pub seed_user: Option<(String, String)>,
    pub audit_log: Option<PathBuf>,
    pub tls: Option<(PathBuf, PathBuf)>,
    pub json_logs: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, PORT_ENV, 8080, "a TCP port")?;
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
                expected: "an IP address",
            })?;

        let store = match lookup(SESSION_STORE_ENV).as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::Memory {
                capacity: parse_or(
                    &lookup,
                    SESSION_CACHE_CAPACITY_ENV,
                    crate::storage::memory::DEFAULT_CAPACITY,
                    "a session count",
                )?,
            },
            Some("redb") => StoreBackend::Redb {
                path: lookup(SESSION_DB_PATH_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DB_PATH)),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: SESSION_STORE_ENV,
                    value: other.to_string(),
                    expected: "`memory` or `redb`",
                })
            }
        };

        let purge_secs: u64 = parse_or(
            &lookup,
            SESSION_PURGE_INTERVAL_ENV,
            DEFAULT_PURGE_INTERVAL.as_secs(),
            "a number of seconds",
        )?;

        let seed_user = match lookup(SEED_USER_ENV) {
            Some(raw) => match raw.split_once(':') {
                Some((user, pass)) if !user.is_empty() && !pass.is_empty() => {
                    Some((user.to_string(), pass.to_string()))
                }
                _ => {
                    return Err(ConfigError::Invalid {
                        name: SEED_USER_ENV,
                        value: "<hidden>".to_string(),
                        expected: "`username:password`",
                    })
                }
            },
            None => None,
        };

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        Ok(Self {
            bind_addr,
            store,
            purge_interval: Duration::from_secs(purge_secs.max(1)),
            users_file: lookup(USERS_FILE_ENV).map(PathBuf::from),
            seed_user,
            audit_log: lookup(AUDIT_LOG_PATH_ENV).map(PathBuf::from),
            tls,
            json_logs: lookup(LOG_FORMAT_ENV)
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
            expected,
        }),
        None => Ok(default),
    }
}
