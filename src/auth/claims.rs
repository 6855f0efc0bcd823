// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token claims and the normalized identity derived from them.

use serde::{Deserialize, Serialize};

/// Display name used when the token carries no `name`.
pub const UNKNOWN_DISPLAY_NAME: &str = "unknown";

/// Claims decoded from a verified ID token.
///
/// Only produced by [`TokenVerifier`](super::verifier::TokenVerifier) after
/// the signature and the standard claims have been checked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdTokenClaims {
    /// Issuer
    pub iss: String,
    /// Audience (the client ID the token was minted for)
    pub aud: String,
    /// Subject (stable provider user ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// A single value entry, as in `emails: [{ value }]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileValue {
    pub value: String,
}

/// Structured name parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileName {
    pub given_name: String,
    pub family_name: String,
}

/// Normalized identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Identity provider (the token issuer)
    pub provider: String,
    /// Provider user ID (`sub`)
    pub id: String,
    pub display_name: String,
    pub name: ProfileName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<ProfileValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<ProfileValue>>,
}

impl Identity {
    /// Map verified claims to an identity. Total: absent or empty optional
    /// claims fall back to defaults or are omitted.
    pub fn from_claims(claims: &IdTokenClaims) -> Self {
        let display_name = non_empty(&claims.name)
            .unwrap_or(UNKNOWN_DISPLAY_NAME)
            .to_string();

        Self {
            provider: claims.iss.clone(),
            id: claims.sub.clone(),
            display_name,
            name: ProfileName {
                given_name: non_empty(&claims.given_name).unwrap_or_default().to_string(),
                family_name: non_empty(&claims.family_name)
                    .unwrap_or_default()
                    .to_string(),
            },
            emails: single_value(&claims.email),
            photos: single_value(&claims.picture),
        }
    }

    /// First email address, if any.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .as_ref()
            .and_then(|emails| emails.first())
            .map(|e| e.value.as_str())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn single_value(value: &Option<String>) -> Option<Vec<ProfileValue>> {
    non_empty(value).map(|v| {
        vec![ProfileValue {
            value: v.to_string(),
        }]
    })
}
