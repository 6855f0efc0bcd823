// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Setup-time errors.
//!
//! Everything here is fatal and surfaces from constructors, never from the
//! per-request path. A misconfigured verifier must refuse to start rather
//! than quietly accept tokens it cannot bind to this client.

/// Fatal configuration error raised while building the auth components.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("client ID is required: checking tokens without an audience is insecure")]
    MissingAudience,

    #[error("at least one accepted issuer is required")]
    MissingIssuer,

    #[error("authentication realm must not contain a double quote")]
    RealmContainsQuote,

    #[error("authentication realm is not a valid header value: {0}")]
    InvalidRealm(String),

    #[error("invalid signing-key endpoint {url}: {reason}")]
    InvalidKeySource { url: String, reason: String },

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
