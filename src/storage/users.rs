// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory backed by a JSON file.
//!
//! ```text
//! [
//!   { "id": "1", "username": "alice", "display_name": "Alice",
//!     "password_hash": "$argon2id$v=19$..." }
//! ]
//! ```
//!
//! Passwords are stored as argon2 PHC strings and never leave this module
//! in clear.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::auth::{Authenticatable, Credentials, UserId, UserProvider};

/// Credential field checked against the stored hash.
pub const PASSWORD_FIELD: &str = "password";

const SALT_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid users file: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("user directory lock poisoned")]
    LockPoisoned,

    #[error("password hash error: {0}")]
    Hash(String),

    #[error("random number generator failed")]
    Rng,

    #[error("user already exists: {0}")]
    Duplicate(String),
}

/// A directory entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub password_hash: String,
}

impl std::fmt::Debug for DirectoryUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

impl Authenticatable for DirectoryUser {
    fn auth_identifier(&self) -> UserId {
        self.id.clone()
    }
}

impl DirectoryUser {
    /// Whether every non-secret credential field names this user.
    fn matches(&self, credentials: &Credentials) -> bool {
        credentials
            .iter()
            .filter(|(field, _)| !Credentials::is_secret_field(field))
            .all(|(field, value)| match field {
                "id" => self.id.as_str() == value,
                "username" => self.username == value,
                _ => false,
            })
    }
}

#[derive(Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, DirectoryUser>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load users from a JSON array file.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path)?;
        let users: Vec<DirectoryUser> = serde_json::from_str(&content)?;

        let directory = Self::new();
        for user in users {
            directory.insert(user)?;
        }
        tracing::info!(
            path = %path.display(),
            users = directory.len(),
            "Loaded user directory"
        );
        Ok(directory)
    }

    /// Write all users to `path` as a JSON array.
    pub fn save(&self, path: &Path) -> Result<(), DirectoryError> {
        let mut users: Vec<DirectoryUser> = self
            .users
            .read()
            .map_err(|_| DirectoryError::LockPoisoned)?
            .values()
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&users)?)?;
        Ok(())
    }

    /// Add a user with an already hashed password.
    pub fn insert(&self, user: DirectoryUser) -> Result<(), DirectoryError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DirectoryError::LockPoisoned)?;
        if users.contains_key(&user.id) || users.values().any(|u| u.username == user.username) {
            return Err(DirectoryError::Duplicate(user.username));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Hash `password` and add the user.
    pub fn register(
        &self,
        id: impl Into<UserId>,
        username: impl Into<String>,
        password: &str,
    ) -> Result<DirectoryUser, DirectoryError> {
        let user = DirectoryUser {
            id: id.into(),
            username: username.into(),
            display_name: None,
            password_hash: hash_password(password)?,
        };
        self.insert(user.clone())?;
        Ok(user)
    }

    /// Register `username` under a fresh uuid unless the name is taken, then
    /// write the directory to `persist_to`. Returns the new user, or `None`
    /// when one already existed.
    pub fn seed(
        &self,
        username: &str,
        password: &str,
        persist_to: Option<&Path>,
    ) -> Result<Option<DirectoryUser>, DirectoryError> {
        let seeded = match self.register(uuid::Uuid::new_v4().to_string(), username, password) {
            Ok(user) => Some(user),
            Err(DirectoryError::Duplicate(_)) => None,
            Err(e) => return Err(e),
        };
        if let (Some(_), Some(path)) = (&seeded, persist_to) {
            self.save(path)?;
        }
        Ok(seeded)
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Argon2 PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| DirectoryError::Rng)?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| DirectoryError::Hash(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DirectoryError::Hash(e.to_string()))?;
    Ok(phc.to_string())
}

impl UserProvider for UserDirectory {
    type User = DirectoryUser;
    type Error = DirectoryError;

    fn retrieve_by_id(&self, id: &UserId) -> Result<Option<DirectoryUser>, DirectoryError> {
        let users = self.users.read().map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(users.get(id).cloned())
    }

    fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<DirectoryUser>, DirectoryError> {
        let has_identity = credentials
            .iter()
            .any(|(field, _)| !Credentials::is_secret_field(field));
        if !has_identity {
            return Ok(None);
        }

        let users = self.users.read().map_err(|_| DirectoryError::LockPoisoned)?;
        Ok(users.values().find(|u| u.matches(credentials)).cloned())
    }

    fn validate_credentials(
        &self,
        user: &DirectoryUser,
        credentials: &Credentials,
    ) -> Result<bool, DirectoryError> {
        let Some(password) = credentials.get(PASSWORD_FIELD) else {
            return Ok(false);
        };
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| DirectoryError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
