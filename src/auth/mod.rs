// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer ID token authentication against a third-party identity provider
//! (Google by default).
//!
//! ## Auth Flow
//!
//! 1. Client signs in with the provider and obtains an ID token
//! 2. Client sends `Authorization: Bearer <ID token>` (or `?id_token=`)
//! 3. Server:
//!    - Looks up the token's `kid` in the locally cached signing keys
//!    - Verifies signature, issuer, audience (client ID) and expiry
//!    - Maps the claims to an [`Identity`] in the request extensions
//! 4. Protected routes are wrapped in a [`Guard`] that answers `401` when no
//!    identity is present
//!
//! ## Key Rotation
//!
//! - Keys are fetched over HTTPS in the background, never per request
//! - A refresh runs hourly, checked on a five-minute tick
//! - A failed refresh keeps the previous keys and retries on the next tick

pub mod certs;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod middleware;
pub mod refresher;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use certs::{CertificateCache, SigningKey};
pub use claims::{IdTokenClaims, Identity};
pub use error::{ClaimMismatch, KeyFetchError, Unauthorized, VerificationFailure};
pub use extractor::{extract_token, Auth, OptionalAuth};
pub use guard::{require_identity, Guard, GuardOptions};
pub use middleware::{authenticate, Authenticator};
pub use refresher::CertificateRefresher;
pub use verifier::TokenVerifier;
