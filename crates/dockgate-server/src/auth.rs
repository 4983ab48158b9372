// crates/dockgate-server/src/auth.rs
// ============================================================================
// Module: Status Surface Auth
// Description: Shared-secret token enforcement for the status surface.
// Purpose: Gate status queries behind an optional token, failing closed.
// Dependencies: axum, sha2, subtle
// ============================================================================

//! ## Overview
//! When a status token is configured every status query must present it via
//! the `X-Status-Token` header, an `Authorization: Bearer` header, or a
//! `token` query parameter (checked in that order). The query parameter is
//! form-decoded by the HTTP layer before it reaches this module. Comparison is
//! constant time. When no token is configured the surface is open.
//!
//! Security posture: every decision is audited with a SHA-256 fingerprint of
//! the presented token; the token itself is never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the status token.
pub const STATUS_TOKEN_HEADER: &str = "x-status-token";

/// Query parameter carrying the status token.
pub const STATUS_TOKEN_QUERY: &str = "token";

/// Largest header value inspected for a token.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Where a presented token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `X-Status-Token` header.
    Header,
    /// `Authorization: Bearer` header.
    Bearer,
    /// `token` query parameter.
    Query,
}

impl TokenSource {
    /// Returns the audit label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Bearer => "bearer",
            Self::Query => "query",
        }
    }
}

/// Token presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedToken {
    /// Token location.
    pub source: TokenSource,
    /// Token value.
    pub value: String,
}

/// Status authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusAuthError {
    /// No token was presented.
    #[error("missing status token")]
    Missing,
    /// A token was presented but does not match.
    #[error("invalid status token")]
    Invalid,
    /// A token header could not be read.
    #[error("malformed authorization header")]
    Malformed,
}

// ============================================================================
// SECTION: Status Auth
// ============================================================================

/// Token gate for the status surface.
#[derive(Clone)]
pub struct StatusAuth {
    /// Configured token; `None` leaves the surface open.
    token: Option<String>,
    /// Audit sink for decisions.
    audit: Arc<dyn AuditSink>,
}

impl StatusAuth {
    /// Creates a gate for `token`.
    #[must_use]
    pub fn new(token: Option<String>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            token: token.filter(|value| !value.is_empty()),
            audit,
        }
    }

    /// Returns true when no token is configured.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.token.is_none()
    }

    /// Checks the request credentials and audits the decision.
    ///
    /// `query_token` is the decoded `token` query parameter, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StatusAuthError`] when a token is configured and the request
    /// does not present a matching one.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), StatusAuthError> {
        let Some(expected) = &self.token else {
            self.audit.emit(AuditEvent::StatusAuth {
                decision: "allow",
                method: Some("open"),
                token_fingerprint: None,
                reason: None,
            });
            return Ok(());
        };
        let presented = match presented_token(headers, query_token) {
            Ok(Some(presented)) => presented,
            Ok(None) => return Err(self.deny(None, StatusAuthError::Missing)),
            Err(err) => return Err(self.deny(None, err)),
        };
        if !constant_time_eq_str(&presented.value, expected) {
            return Err(self.deny(Some(&presented), StatusAuthError::Invalid));
        }
        self.audit.emit(AuditEvent::StatusAuth {
            decision: "allow",
            method: Some(presented.source.label()),
            token_fingerprint: Some(token_fingerprint(&presented.value)),
            reason: None,
        });
        Ok(())
    }

    /// Audits a denial and returns the error.
    fn deny(&self, presented: Option<&PresentedToken>, error: StatusAuthError) -> StatusAuthError {
        self.audit.emit(AuditEvent::StatusAuth {
            decision: "deny",
            method: presented.map(|token| token.source.label()),
            token_fingerprint: presented.map(|token| token_fingerprint(&token.value)),
            reason: Some(error.to_string()),
        });
        error
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the first presented token by precedence.
///
/// # Errors
///
/// Returns [`StatusAuthError::Malformed`] when a token header is oversized,
/// not valid text, or uses a scheme other than `Bearer`.
pub fn presented_token(
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<Option<PresentedToken>, StatusAuthError> {
    if let Some(value) = headers.get(STATUS_TOKEN_HEADER) {
        let value = header_text(value.as_bytes())?;
        if !value.is_empty() {
            return Ok(Some(PresentedToken {
                source: TokenSource::Header,
                value: value.to_string(),
            }));
        }
    }
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = header_text(value.as_bytes())?;
        return parse_bearer_token(value).map(|token| {
            Some(PresentedToken {
                source: TokenSource::Bearer,
                value: token.to_string(),
            })
        });
    }
    Ok(query_token.filter(|value| !value.is_empty()).map(|value| PresentedToken {
        source: TokenSource::Query,
        value: value.to_string(),
    }))
}

/// Validates and trims a header value.
fn header_text(bytes: &[u8]) -> Result<&str, StatusAuthError> {
    if bytes.len() > MAX_AUTH_HEADER_BYTES {
        return Err(StatusAuthError::Malformed);
    }
    std::str::from_utf8(bytes).map(str::trim).map_err(|_| StatusAuthError::Malformed)
}

/// Parses `Bearer <token>`.
fn parse_bearer_token(header: &str) -> Result<&str, StatusAuthError> {
    let (scheme, token) = header.split_once(' ').ok_or(StatusAuthError::Malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(StatusAuthError::Malformed);
    }
    Ok(token)
}

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_eq_str(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Returns the lowercase hex SHA-256 fingerprint of `token`.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
