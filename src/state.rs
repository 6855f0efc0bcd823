// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Authenticator, CertificateCache, Guard, GuardOptions, TokenVerifier};
use crate::config::Settings;
use crate::error::ConfigError;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CertificateCache>,
    pub authenticator: Arc<Authenticator>,
    pub guard: Guard,
}

impl AppState {
    pub fn new(cache: Arc<CertificateCache>, authenticator: Authenticator, guard: Guard) -> Self {
        Self {
            cache,
            authenticator: Arc::new(authenticator),
            guard,
        }
    }

    /// Build the cache, authenticator and guard from settings. Keys are not
    /// fetched here; start a [`CertificateRefresher`](crate::auth::CertificateRefresher)
    /// for that.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let cache = Arc::new(
            CertificateCache::new(&settings.certs_url)?
                .with_refresh_interval(settings.refresh_interval),
        );

        let verifier = TokenVerifier::new(cache.clone(), settings.client_id.clone())?
            .with_issuers(settings.issuers.iter().cloned())?;
        let guard = Guard::new(GuardOptions {
            realm: settings.realm.clone(),
        })?;

        Ok(Self::new(cache, Authenticator::from_verifier(verifier), guard))
    }
}
