// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction and Axum extractors for the authenticated identity.
//!
//! [`extract_token`] finds the candidate token on an incoming request. The
//! `Auth` and `OptionalAuth` extractors read the identity that the
//! authentication middleware attached, for handlers that prefer extraction
//! over a route-level guard:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is Identity
//! }
//! ```

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use serde::Deserialize;

use super::{
    guard::{Guard, DEFAULT_REALM},
    Identity, Unauthorized,
};

/// Query parameter carrying the token when no header is sent.
pub const TOKEN_QUERY_PARAM: &str = "id_token";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    id_token: Option<String>,
}

/// Pull a candidate token out of the request.
///
/// `Authorization: Bearer <token>` wins over the `id_token` query parameter.
/// The header must split into exactly two whitespace-separated parts with a
/// case-insensitive `Bearer` scheme; anything else falls through to the
/// query form. Returns `None` when neither carries a token.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    bearer_from_header(headers).or_else(|| token_from_query(uri))
}

fn bearer_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;

    let mut parts = value.split_ascii_whitespace();
    let (scheme, credentials) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }

    Some(credentials.to_string())
}

fn token_from_query(uri: &Uri) -> Option<String> {
    // A repeated parameter fails to deserialize and is ignored.
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()?
        .0
        .id_token
        .filter(|token| !token.is_empty())
}

/// Extractor for authenticated requests.
///
/// Rejects with `401` when the authentication middleware attached no
/// identity. The challenge comes from the [`Guard`] in the request
/// extensions, falling back to the default realm `jwt` when none is there.
pub struct Auth(pub Identity);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(Auth(identity.clone())),
            None => Err(match parts.extensions.get::<Guard>() {
                Some(guard) => guard.rejection(),
                None => Unauthorized::for_realm(DEFAULT_REALM)
                    .unwrap_or(Unauthorized { challenge: None }),
            }),
        }
    }
}

/// Optional authentication extractor.
///
/// Yields `None` instead of rejecting when no identity is attached.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<Identity>().cloned()))
    }
}
