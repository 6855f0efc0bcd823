// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs on every request and never rejects. When a valid token is present
//! the resulting [`Identity`] is inserted into the request extensions;
//! otherwise the request continues unauthenticated and a guard (or the
//! `Auth` extractor) decides what to do.
//!
//! ```rust,ignore
//! let authenticator = Arc::new(Authenticator::new(cache, client_id)?);
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         authenticator,
//!         authenticate,
//!     ));
//! ```

use std::sync::Arc;

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use tracing::{debug, warn};

use super::certs::CertificateCache;
use super::error::VerificationFailure;
use super::extractor::extract_token;
use super::verifier::TokenVerifier;
use super::Identity;
use crate::error::ConfigError;

/// Token-to-identity pipeline shared by all requests.
#[derive(Clone)]
pub struct Authenticator {
    verifier: TokenVerifier,
}

impl Authenticator {
    /// Create an authenticator for `client_id` using the shared key cache.
    ///
    /// Fails if `client_id` is empty.
    pub fn new(
        cache: Arc<CertificateCache>,
        client_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            verifier: TokenVerifier::new(cache, client_id)?,
        })
    }

    /// Create from an already configured verifier.
    pub fn from_verifier(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Verify `token` and map it to an identity. Failures are logged and
    /// yield `None`.
    pub fn verify_token(&self, token: &str) -> Option<Identity> {
        match self.verifier.verify(token) {
            Ok(claims) => {
                debug!(sub = %claims.sub, iss = %claims.iss, "ID token verified");
                Some(Identity::from_claims(&claims))
            }
            Err(failure) => {
                log_failure(&failure);
                None
            }
        }
    }

    /// Attach an identity to `request` unless one is already there.
    ///
    /// Returns whether the request carries an identity afterwards.
    pub fn authenticate_request(&self, request: &mut Request) -> bool {
        if request.extensions().get::<Identity>().is_some() {
            return true;
        }

        let Some(token) = extract_token(request.headers(), request.uri()) else {
            return false;
        };

        match self.verify_token(&token) {
            Some(identity) => {
                request.extensions_mut().insert(identity);
                true
            }
            None => false,
        }
    }
}

fn log_failure(failure: &VerificationFailure) {
    match failure {
        // Expected traffic: stale or foreign tokens.
        VerificationFailure::ClaimMismatch(_) | VerificationFailure::Malformed(_) => {
            debug!(reason = failure.error_code(), error = %failure, "ID token rejected");
        }
        VerificationFailure::UnknownKey(kid) => {
            warn!(reason = failure.error_code(), %kid, "ID token rejected");
        }
        VerificationFailure::BadSignature => {
            warn!(reason = failure.error_code(), "ID token rejected");
        }
    }
}

/// Authentication middleware function.
///
/// Always passes the request on.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    authenticator.authenticate_request(&mut request);
    next.run(request).await
}
