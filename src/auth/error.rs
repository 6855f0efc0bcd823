// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! None of these abort a request. Verification failures and key-fetch
//! failures are logged and absorbed; the only outward effect is the 401
//! produced by [`Unauthorized`] when a protected route sees no identity.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Which standard claim failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMismatch {
    /// `iss` is not one of the accepted issuers
    Issuer,
    /// `aud` is not the configured client ID
    Audience,
    /// `exp` is not strictly in the future
    Expired,
    /// `nbf` is in the future
    NotYetValid,
}

impl std::fmt::Display for ClaimMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimMismatch::Issuer => write!(f, "issuer"),
            ClaimMismatch::Audience => write!(f, "audience"),
            ClaimMismatch::Expired => write!(f, "expiry"),
            ClaimMismatch::NotYetValid => write!(f, "not-before"),
        }
    }
}

/// Reason a token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// Token could not be decoded, or lacks a `kid` or a required claim
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// No signing key with this `kid` in the current key set
    #[error("no signing key for kid {0:?}")]
    UnknownKey(String),

    /// Signature does not verify against the located key
    #[error("token signature is invalid")]
    BadSignature,

    /// Signature is fine but a standard claim is wrong
    #[error("token {0} claim mismatch")]
    ClaimMismatch(ClaimMismatch),
}

impl VerificationFailure {
    /// Stable code for log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerificationFailure::Malformed(_) => "malformed_token",
            VerificationFailure::UnknownKey(_) => "unknown_key",
            VerificationFailure::BadSignature => "bad_signature",
            VerificationFailure::ClaimMismatch(ClaimMismatch::Issuer) => "invalid_issuer",
            VerificationFailure::ClaimMismatch(ClaimMismatch::Audience) => "invalid_audience",
            VerificationFailure::ClaimMismatch(ClaimMismatch::Expired) => "token_expired",
            VerificationFailure::ClaimMismatch(ClaimMismatch::NotYetValid) => {
                "token_not_yet_valid"
            }
        }
    }
}

/// Failure to load the signing-key set. The cache keeps its previous keys.
#[derive(Debug, thiserror::Error)]
pub enum KeyFetchError {
    #[error("signing-key request failed: {0}")]
    Request(String),

    #[error("HTTP {0} from signing-key endpoint")]
    Status(u16),

    #[error("signing-key response was invalid: {0}")]
    InvalidResponse(String),

    #[error("signing-key response contained no usable keys")]
    NoUsableKeys,
}

/// The guard's rejection: `401` with an optional bearer challenge.
#[derive(Debug, Clone)]
pub struct Unauthorized {
    pub(crate) challenge: Option<HeaderValue>,
}

impl Unauthorized {
    /// Build the challenge for `realm`. An empty realm sends no header.
    pub(crate) fn for_realm(realm: &str) -> Result<Self, crate::error::ConfigError> {
        if realm.is_empty() {
            return Ok(Self { challenge: None });
        }

        let value = HeaderValue::from_str(&format!("Bearer realm=\"{realm}\""))
            .map_err(|e| crate::error::ConfigError::InvalidRealm(e.to_string()))?;
        Ok(Self {
            challenge: Some(value),
        })
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        if let Some(challenge) = self.challenge {
            response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
