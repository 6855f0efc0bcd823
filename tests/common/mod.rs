// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Common test utilities for integration tests
//!
//! Token signing with the fixture RSA keys, and a mock signing-key endpoint.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use id_token_guard::auth::{Authenticator, CertificateCache, Guard, GuardOptions};
use id_token_guard::state::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const JWKS: &str = include_str!("../fixtures/jwks.json");
pub const PRIMARY_KEY_PEM: &[u8] = include_bytes!("../fixtures/primary.pem");
pub const ROTATED_KEY_PEM: &[u8] = include_bytes!("../fixtures/rotated.pem");

pub const PRIMARY_KID: &str = "test-key-1";
pub const ROTATED_KID: &str = "test-key-2";
pub const CLIENT_ID: &str = "client123";

/// JWK set containing only the keys whose kid is listed.
pub fn jwks_with(kids: &[&str]) -> Value {
    let mut doc: Value = serde_json::from_str(JWKS).expect("fixture JWKS");
    doc["keys"]
        .as_array_mut()
        .expect("keys array")
        .retain(|k| kids.contains(&k["kid"].as_str().unwrap_or_default()));
    doc
}

/// Claims of the documented scenario: a valid Google token for `client123`.
pub fn scenario_claims() -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": "accounts.google.com",
        "aud": CLIENT_ID,
        "sub": "42",
        "iat": now,
        "exp": now + 3600,
        "email": "a@b.com",
        "name": "A B",
    })
}

pub fn sign_with(pem: &[u8], kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem).expect("fixture PEM");
    encode(&header, claims, &key).expect("sign token")
}

pub fn sign(claims: &Value) -> String {
    sign_with(PRIMARY_KEY_PEM, PRIMARY_KID, claims)
}

/// Mock signing-key endpoint.
pub struct MockKeyServer {
    pub server: MockServer,
    pub certs_url: String,
}

impl MockKeyServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let certs_url = format!("{}/oauth2/v3/certs", server.uri());
        Self { server, certs_url }
    }

    /// Serve `body` as the key set, replacing any earlier behavior.
    pub async fn serve_keys(&self, body: Value) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v3/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer every key request with `status`.
    pub async fn fail_with(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v3/certs"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Answer with a 200 whose body is not a key set.
    pub async fn serve_garbage(&self) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v3/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&self.server)
            .await;
    }

    /// Serve the fixture keys only after `delay`.
    pub async fn serve_slowly(&self, delay: Duration) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v3/certs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(JWKS)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub fn cache(&self) -> Arc<CertificateCache> {
        Arc::new(CertificateCache::new(&self.certs_url).expect("loopback URL is allowed"))
    }
}

/// Application state around `cache`, audience `client_id`, default realm.
pub fn app_state(cache: Arc<CertificateCache>, client_id: &str) -> AppState {
    let authenticator = Authenticator::new(cache.clone(), client_id).expect("client ID");
    let guard = Guard::new(GuardOptions::default()).expect("default realm");
    AppState::new(cache, authenticator, guard)
}

/// Cache preloaded with both fixture keys, no network involved.
pub fn loaded_cache() -> Arc<CertificateCache> {
    let cache = CertificateCache::new("https://www.googleapis.com/oauth2/v3/certs")
        .expect("default URL");
    cache.replace_keys(JWKS.as_bytes()).expect("fixture keys");
    Arc::new(cache)
}
