// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token-signing helpers for unit tests.
//!
//! Keys come from `tests/fixtures`: two RSA private keys and the JWK set
//! publishing their public halves as `test-key-1` and `test-key-2`.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use super::certs::{CertificateCache, DEFAULT_CERTS_URL};

pub const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");
pub const PRIMARY_KEY_PEM: &[u8] = include_bytes!("../../tests/fixtures/primary.pem");
pub const ROTATED_KEY_PEM: &[u8] = include_bytes!("../../tests/fixtures/rotated.pem");

pub const PRIMARY_KID: &str = "test-key-1";
pub const CLIENT_ID: &str = "client123";
pub const ISSUER: &str = "accounts.google.com";

/// Cache preloaded with both fixture keys.
pub fn loaded_cache() -> Arc<CertificateCache> {
    let cache = CertificateCache::new(DEFAULT_CERTS_URL).expect("cache");
    cache.replace_keys(JWKS.as_bytes()).expect("fixture keys");
    Arc::new(cache)
}

/// Claims for a valid token expiring in an hour.
pub fn valid_claims() -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "sub": "42",
        "iat": now,
        "exp": now + 3600,
        "email": "a@b.com",
        "email_verified": true,
        "name": "A B",
        "given_name": "A",
        "family_name": "B",
    })
}

/// Sign `claims` with `pem`, labelled with `kid`.
pub fn sign_with(pem: &[u8], kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem).expect("fixture PEM");
    encode(&header, claims, &key).expect("sign token")
}

/// Sign `claims` with the primary fixture key.
pub fn sign(claims: &Value) -> String {
    sign_with(PRIMARY_KEY_PEM, PRIMARY_KID, claims)
}
