// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read access to the inbound request.

use axum::http::{request::Parts, HeaderMap};

/// The part of a request the guard needs: header lookup.
pub trait RequestAccessor: Send + Sync {
    /// Value of the named header, if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<String>;
}

impl RequestAccessor for HeaderMap {
    fn header(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }
}

impl RequestAccessor for Parts {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.header(name)
    }
}

/// Placeholder for guards built before their request is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRequest;

impl RequestAccessor for EmptyRequest {
    fn header(&self, _name: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderValue, Request};

    #[test]
    fn header_map_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("tok"));
        assert_eq!(headers.header("authorization").as_deref(), Some("tok"));
        assert_eq!(headers.header("Authorization").as_deref(), Some("tok"));
        assert_eq!(headers.header("x-missing"), None);
    }

    #[test]
    fn non_utf8_header_reads_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(&[0xFF, 0xFE]).unwrap());
        assert_eq!(headers.header("authorization"), None);
    }

    #[test]
    fn parts_delegate_to_headers() {
        let (parts, _) = Request::builder()
            .header("Authorization", "abc")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(parts.header("Authorization").as_deref(), Some("abc"));
        assert_eq!(EmptyRequest.header("Authorization"), None);
    }
}
