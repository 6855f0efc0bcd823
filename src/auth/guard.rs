// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route guard that requires an authenticated identity.
//!
//! Requests without an [`Identity`] in their extensions get
//! `401 Unauthorized` with `WWW-Authenticate: Bearer realm="<realm>"`;
//! everything else passes through untouched.
//!
//! ```rust,ignore
//! let guard = Guard::new(GuardOptions::default())?;
//!
//! let api = Router::new()
//!     .route("/hello", get(hello))
//!     .route_layer(axum::middleware::from_fn_with_state(guard, require_identity));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{Identity, Unauthorized};
use crate::error::ConfigError;

/// Realm used when none is configured.
pub const DEFAULT_REALM: &str = "jwt";

/// Guard configuration.
#[derive(Debug, Clone, Default)]
pub struct GuardOptions {
    /// Challenge realm. `None` means [`DEFAULT_REALM`]; an empty string
    /// sends no `WWW-Authenticate` header.
    pub realm: Option<String>,
}

impl GuardOptions {
    pub fn with_realm(realm: impl Into<String>) -> Self {
        Self {
            realm: Some(realm.into()),
        }
    }
}

/// Validated guard, ready to be used as middleware state.
#[derive(Debug, Clone)]
pub struct Guard {
    realm: String,
    rejection: Unauthorized,
}

impl Guard {
    /// Validate the options. A realm containing `"` is refused here so a
    /// broken challenge header can never reach a client.
    pub fn new(options: GuardOptions) -> Result<Self, ConfigError> {
        let realm = options.realm.unwrap_or_else(|| DEFAULT_REALM.to_string());
        if realm.contains('"') {
            return Err(ConfigError::RealmContainsQuote);
        }

        let rejection = Unauthorized::for_realm(&realm)?;
        Ok(Self { realm, rejection })
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The `401` response this guard sends.
    pub fn rejection(&self) -> Unauthorized {
        self.rejection.clone()
    }

    /// Pass the request on if it carries an identity, otherwise reject.
    pub fn check(&self, request: &Request) -> Result<(), Unauthorized> {
        if request.extensions().get::<Identity>().is_some() {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }
}

/// Guard middleware function.
pub async fn require_identity(
    State(guard): State<Guard>,
    request: Request,
    next: Next,
) -> Response {
    match guard.check(&request) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}
