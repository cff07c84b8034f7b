// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login credentials.
//!
//! Credentials are an opaque field → value map. Their meaning belongs to the
//! user provider; the guard only forwards them. Fields whose name contains
//! `password` or `secret` are considered secret and never leave the process
//! through `Debug` or audit output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const REDACTED: &str = "[REDACTED]";

/// Fields that name a user. Every other field is treated as a secret.
const IDENTITY_FIELDS: &[&str] = &["id", "user", "username", "login", "email", "name"];

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a field name denotes a secret value. Anything that is not a
    /// known identity field counts.
    pub fn is_secret_field(field: &str) -> bool {
        !IDENTITY_FIELDS
            .iter()
            .any(|identity| field.eq_ignore_ascii_case(identity))
    }

    /// Copy with secret values masked, safe to log or persist.
    pub fn redacted(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| {
                let value = if Self::is_secret_field(k) {
                    REDACTED.to_string()
                } else {
                    v.clone()
                };
                (k.clone(), value)
            })
            .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credentials").field(&self.redacted()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_secret_fields() {
        let creds = Credentials::new()
            .with("username", "alice")
            .with("password", "hunter2")
            .with("client_secret", "s3cr3t");

        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn short_and_unknown_secret_names_are_masked() {
        let creds = Credentials::new()
            .with("user", "alice")
            .with("pass", "correct")
            .with("api_token", "tok-123")
            .with("otp", "424242");

        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("correct"));
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("424242"));
        assert!(!Credentials::is_secret_field("Email"));
    }

    #[test]
    fn redacted_keeps_field_names() {
        let creds: Credentials = [("username", "alice"), ("Password", "x")].into_iter().collect();
        let redacted = creds.redacted();
        assert_eq!(redacted["username"], "alice");
        assert_eq!(redacted["Password"], REDACTED);
    }

    #[test]
    fn deserializes_from_flat_object() {
        let creds: Credentials =
            serde_json::from_str(r#"{"username":"alice","password":"pw"}"#).unwrap();
        assert_eq!(creds.get("username"), Some("alice"));
        assert_eq!(creds.get("password"), Some("pw"));
        assert_eq!(creds.get("email"), None);
    }
}
