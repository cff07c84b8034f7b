// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque bearer tokens and the session key namespace.
//!
//! A token is 32 bytes from the system CSPRNG encoded as unpadded base64url
//! (43 characters, header-safe). It carries no data; it is only a lookup key.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};

/// Prefix of every session key in the token store.
pub const SESSION_KEY_PREFIX: &str = "auth:";

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Store key under which the session for `token` lives.
pub fn session_key(token: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{token}")
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("system random number generator failed")]
    Rng,

    #[error("no unused token found after {0} attempts")]
    Exhausted(usize),
}

/// Source of candidate tokens.
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> Result<String, TokenError>;
}

/// CSPRNG-backed token source.
pub struct RandomTokenSource {
    rng: SystemRandom,
}

impl RandomTokenSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for RandomTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for RandomTokenSource {
    fn next_token(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| TokenError::Rng)?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }
}
