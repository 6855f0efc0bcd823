// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing-key cache for ID token verification.
//!
//! ## Behavior
//!
//! - Keys are fetched as a JWK set from the provider's published endpoint
//! - A successful refresh replaces the whole key map in one atomic swap
//! - A failed refresh keeps the previous keys and marks the cache as due,
//!   so the next refresh check retries immediately
//! - Lookups never fetch and never wait on a refresh in flight
//!
//! The cache is constructed once per process and shared by `Arc`. The
//! refresh schedule lives in [`CertificateRefresher`](super::refresher::CertificateRefresher).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use super::error::KeyFetchError;
use crate::error::ConfigError;

/// Google's JWK-format signing-key endpoint.
pub const DEFAULT_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Time between successful refreshes.
///
/// Google rotates daily; refreshing hourly bounds how stale the keys can get
/// after the host sleeps through a scheduled refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A provider signing key, immutable once fetched.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    key: DecodingKey,
    algorithm: Algorithm,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Convert a JWK into a verification key.
    ///
    /// The algorithm comes from the JWK's `alg` when present, otherwise the
    /// default for its key type. Keys without a `kid`, encryption keys and
    /// unsupported key types are rejected.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        let kid = jwk
            .common
            .key_id
            .clone()
            .ok_or_else(|| "key has no kid".to_string())?;

        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            return Err(format!("key {kid} is an encryption key"));
        }

        let alg = jwk.common.key_algorithm;
        let (key, algorithm) = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => {
                let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                    .map_err(|e| format!("invalid RSA key {kid}: {e}"))?;
                let algorithm = match alg {
                    None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
                    Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                    Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                    Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                    Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                    Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                    Some(other) => return Err(format!("RSA key {kid} declares {other:?}")),
                };
                (key, algorithm)
            }
            AlgorithmParameters::EllipticCurve(ec) => {
                let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                    .map_err(|e| format!("invalid EC key {kid}: {e}"))?;
                let algorithm = match alg {
                    None | Some(KeyAlgorithm::ES256) => Algorithm::ES256,
                    Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                    Some(other) => return Err(format!("EC key {kid} declares {other:?}")),
                };
                (key, algorithm)
            }
            AlgorithmParameters::OctetKeyPair(okp) => {
                let key = DecodingKey::from_ed_components(&okp.x)
                    .map_err(|e| format!("invalid OKP key {kid}: {e}"))?;
                (key, Algorithm::EdDSA)
            }
            AlgorithmParameters::OctetKey(_) => {
                return Err(format!("symmetric key {kid} is not accepted"));
            }
        };

        Ok(Self {
            kid,
            key,
            algorithm,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

/// One complete key map, never partially populated.
#[derive(Default)]
struct KeySnapshot {
    keys: HashMap<String, Arc<SigningKey>>,
    fetched_at: Option<DateTime<Utc>>,
}

/// JWK set with keys left undecoded so one bad entry doesn't sink the rest.
#[derive(Deserialize)]
struct RawKeySet {
    keys: Vec<serde_json::Value>,
}

/// Process-wide store of the provider's current signing keys.
pub struct CertificateCache {
    certs_url: Url,
    refresh_interval: Duration,
    snapshot: ArcSwap<KeySnapshot>,
    /// Unix millis; a refresh check does nothing until this has passed.
    next_refresh_ms: AtomicI64,
    client: reqwest::Client,
}

impl CertificateCache {
    /// Create an empty cache for `certs_url`. Nothing is fetched yet.
    ///
    /// The endpoint must be HTTPS, except for loopback hosts.
    pub fn new(certs_url: &str) -> Result<Self, ConfigError> {
        let certs_url = parse_certs_url(certs_url)?;
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            certs_url,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            snapshot: ArcSwap::from_pointee(KeySnapshot::default()),
            next_refresh_ms: AtomicI64::new(0),
            client,
        })
    }

    /// Create with a custom refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn certs_url(&self) -> &Url {
        &self.certs_url
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Look up a key by `kid` in the current snapshot.
    pub fn get_key(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.snapshot.load().keys.get(kid).cloned()
    }

    pub fn key_count(&self) -> usize {
        self.snapshot.load().keys.len()
    }

    /// When the current keys were installed, if ever.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.snapshot.load().fetched_at
    }

    pub fn next_refresh(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.next_refresh_ms.load(Ordering::Relaxed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether a refresh check at `now` should fetch.
    pub fn is_refresh_due(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.next_refresh_ms.load(Ordering::Relaxed)
    }

    /// Refresh only if the scheduled time has passed. Returns whether a
    /// fetch was attempted.
    pub async fn refresh_if_due(&self) -> bool {
        if !self.is_refresh_due(Utc::now()) {
            return false;
        }
        // Errors are already logged by refresh().
        let _ = self.refresh().await;
        true
    }

    /// Fetch the key set and swap it in.
    ///
    /// On failure the previous keys stay in place and the cache is marked
    /// due, so the next check retries. No lock is held across the fetch;
    /// concurrent refreshes are harmless and the last swap wins.
    pub async fn refresh(&self) -> Result<usize, KeyFetchError> {
        let result = match self.fetch_key_set().await {
            Ok(body) => self.replace_keys(&body),
            Err(e) => Err(e),
        };

        match &result {
            Ok(count) => {
                let next = Utc::now()
                    .timestamp_millis()
                    .saturating_add(duration_millis(self.refresh_interval));
                self.next_refresh_ms.store(next, Ordering::Relaxed);
                info!(
                    key_count = count,
                    next_refresh = %self.next_refresh(),
                    "Signing keys refreshed"
                );
            }
            Err(e) => {
                self.next_refresh_ms.store(0, Ordering::Relaxed);
                warn!(
                    url = %self.certs_url,
                    error = %e,
                    retained_keys = self.key_count(),
                    "Signing key refresh failed; keeping previous keys"
                );
            }
        }

        result
    }

    /// Parse a JWK set document and install its usable keys as the new
    /// snapshot. Unusable entries are skipped; a document with no usable
    /// keys leaves the cache untouched.
    pub fn replace_keys(&self, body: &[u8]) -> Result<usize, KeyFetchError> {
        let raw: RawKeySet = serde_json::from_slice(body)
            .map_err(|e| KeyFetchError::InvalidResponse(e.to_string()))?;

        let mut keys = HashMap::with_capacity(raw.keys.len());
        for value in raw.keys {
            let parsed = serde_json::from_value::<Jwk>(value)
                .map_err(|e| e.to_string())
                .and_then(|jwk| SigningKey::from_jwk(&jwk));
            match parsed {
                Ok(key) => {
                    keys.insert(key.kid.clone(), Arc::new(key));
                }
                Err(reason) => warn!(%reason, "Skipping unusable signing key"),
            }
        }

        if keys.is_empty() {
            return Err(KeyFetchError::NoUsableKeys);
        }

        let count = keys.len();
        self.snapshot.store(Arc::new(KeySnapshot {
            keys,
            fetched_at: Some(Utc::now()),
        }));
        Ok(count)
    }

    async fn fetch_key_set(&self) -> Result<Vec<u8>, KeyFetchError> {
        let response = self
            .client
            .get(self.certs_url.clone())
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }
}

fn parse_certs_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidKeySource {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        _ => Err(invalid("signing keys must be fetched over HTTPS")),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");

    #[test]
    fn rejects_plain_http_for_remote_hosts() {
        assert!(CertificateCache::new("http://www.googleapis.com/oauth2/v3/certs").is_err());
        assert!(CertificateCache::new("not a url").is_err());
        assert!(CertificateCache::new("http://127.0.0.1:8080/certs").is_ok());
        assert!(CertificateCache::new(DEFAULT_CERTS_URL).is_ok());
    }

    #[test]
    fn new_cache_is_empty_and_due() {
        let cache = CertificateCache::new(DEFAULT_CERTS_URL).unwrap();
        assert_eq!(cache.key_count(), 0);
        assert!(cache.last_refreshed().is_none());
        assert!(cache.get_key("test-key-1").is_none());
        assert!(cache.is_refresh_due(Utc::now()));
    }

    #[test]
    fn custom_refresh_interval() {
        let cache = CertificateCache::new(DEFAULT_CERTS_URL)
            .unwrap()
            .with_refresh_interval(Duration::from_secs(60));
        assert_eq!(cache.refresh_interval(), Duration::from_secs(60));
    }

    #[test]
    fn replace_keys_installs_every_usable_key() {
        let cache = CertificateCache::new(DEFAULT_CERTS_URL).unwrap();
        assert_eq!(cache.replace_keys(JWKS.as_bytes()).unwrap(), 2);

        let key = cache.get_key("test-key-1").unwrap();
        assert_eq!(key.kid(), "test-key-1");
        assert_eq!(key.algorithm(), Algorithm::RS256);
        assert!(cache.get_key("test-key-2").is_some());
        assert!(cache.last_refreshed().is_some());
    }

    #[test]
    fn replace_keys_is_a_full_swap() {
        let cache = CertificateCache::new(DEFAULT_CERTS_URL).unwrap();
        cache.replace_keys(JWKS.as_bytes()).unwrap();

        let mut doc: serde_json::Value = serde_json::from_str(JWKS).unwrap();
        doc["keys"].as_array_mut().unwrap().remove(0);
        cache
            .replace_keys(serde_json::to_vec(&doc).unwrap().as_slice())
            .unwrap();

        assert!(cache.get_key("test-key-1").is_none());
        assert!(cache.get_key("test-key-2").is_some());
    }

    #[test]
    fn unusable_entries_are_skipped() {
        let mut doc: serde_json::Value = serde_json::from_str(JWKS).unwrap();
        let keys = doc["keys"].as_array_mut().unwrap();
        keys.push(serde_json::json!({ "kty": "oct", "kid": "hmac", "k": "c2VjcmV0" }));
        keys.push(serde_json::json!({ "kty": "banana", "kid": "weird" }));
        keys.push(serde_json::json!({ "kty": "RSA", "n": "AQAB", "e": "AQAB" }));

        let cache = CertificateCache::new(DEFAULT_CERTS_URL).unwrap();
        assert_eq!(
            cache
                .replace_keys(serde_json::to_vec(&doc).unwrap().as_slice())
                .unwrap(),
            2
        );
        assert!(cache.get_key("hmac").is_none());
    }

    #[test]
    fn malformed_document_keeps_previous_keys() {
        let cache = CertificateCache::new(DEFAULT_CERTS_URL).unwrap();
        cache.replace_keys(JWKS.as_bytes()).unwrap();

        assert!(matches!(
            cache.replace_keys(b"<html>oops</html>"),
            Err(KeyFetchError::InvalidResponse(_))
        ));
        assert!(matches!(
            cache.replace_keys(br#"{"keys":[]}"#),
            Err(KeyFetchError::NoUsableKeys)
        ));
        assert_eq!(cache.key_count(), 2);
    }

    #[test]
    fn encryption_keys_are_rejected() {
        let mut doc: serde_json::Value = serde_json::from_str(JWKS).unwrap();
        let mut jwk = doc["keys"][0].take();
        jwk["use"] = "enc".into();
        let jwk: Jwk = serde_json::from_value(jwk).unwrap();
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }
}
