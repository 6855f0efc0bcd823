// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token verification against the cached signing keys.
//!
//! Order of checks:
//!
//! 1. Decode the header (untrusted) for `kid` and `alg`
//! 2. Find the key for `kid` in the current cache snapshot
//! 3. Verify the signature with that key's algorithm
//! 4. Check `iss`, `aud`, `exp` (strictly in the future) and `nbf`
//!
//! Verification reads only the in-memory snapshot, so it never waits on
//! the network.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};

use super::certs::CertificateCache;
use super::claims::IdTokenClaims;
use super::error::{ClaimMismatch, VerificationFailure};
use crate::error::ConfigError;

/// Issuer strings Google puts in ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Claims that must be present for a token to be considered at all.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "aud", "sub"];

/// Validates tokens for one client ID.
#[derive(Clone)]
pub struct TokenVerifier {
    cache: Arc<CertificateCache>,
    audience: String,
    issuers: Vec<String>,
}

impl TokenVerifier {
    /// Create a verifier bound to `audience` (the OAuth client ID),
    /// accepting the Google issuers.
    ///
    /// An empty audience is refused: without it any client's tokens would
    /// verify.
    pub fn new(
        cache: Arc<CertificateCache>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let audience = audience.into();
        if audience.trim().is_empty() {
            return Err(ConfigError::MissingAudience);
        }

        Ok(Self {
            cache,
            audience,
            issuers: GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the accepted issuer strings.
    pub fn with_issuers<I, S>(mut self, issuers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let issuers: Vec<String> = issuers
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        if issuers.is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        self.issuers = issuers;
        Ok(self)
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuers(&self) -> &[String] {
        &self.issuers
    }

    /// Verify `token` and return its claims.
    pub fn verify(&self, token: &str) -> Result<IdTokenClaims, VerificationFailure> {
        let header =
            decode_header(token).map_err(|e| VerificationFailure::Malformed(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| VerificationFailure::Malformed("token header has no kid".to_string()))?;

        let key = self
            .cache
            .get_key(&kid)
            .ok_or(VerificationFailure::UnknownKey(kid))?;

        // The key decides the algorithm; a token claiming another one is forged or broken.
        if header.alg != key.algorithm() {
            return Err(VerificationFailure::BadSignature);
        }

        let mut validation = Validation::new(key.algorithm());
        validation.set_issuer(self.issuers.as_slice());
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.validate_nbf = true;
        validation.leeway = 0;

        let claims = decode::<IdTokenClaims>(token, key.decoding_key(), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidEcdsaKey => VerificationFailure::BadSignature,
                ErrorKind::ExpiredSignature => {
                    VerificationFailure::ClaimMismatch(ClaimMismatch::Expired)
                }
                ErrorKind::InvalidIssuer => {
                    VerificationFailure::ClaimMismatch(ClaimMismatch::Issuer)
                }
                ErrorKind::InvalidAudience => {
                    VerificationFailure::ClaimMismatch(ClaimMismatch::Audience)
                }
                ErrorKind::ImmatureSignature => {
                    VerificationFailure::ClaimMismatch(ClaimMismatch::NotYetValid)
                }
                _ => VerificationFailure::Malformed(e.to_string()),
            })?
            .claims;

        // jsonwebtoken accepts exp == now; the token must still be live.
        if claims.exp <= Utc::now().timestamp() {
            return Err(VerificationFailure::ClaimMismatch(ClaimMismatch::Expired));
        }

        Ok(claims)
    }
}
