// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use tracing::info;

use crate::auth::{Auth, Identity, OptionalAuth};

/// Greets the signed-in user. Mounted behind the guard.
pub async fn hello(Auth(user): Auth) -> String {
    info!(id = %user.id, "Authenticated request");
    format!("Hello {}!", user.display_name)
}

/// Returns the caller's identity.
pub async fn me(Auth(user): Auth) -> Json<Identity> {
    Json(user)
}

/// Public route that personalizes when a token is present.
pub async fn whoami(OptionalAuth(user): OptionalAuth) -> String {
    match user {
        Some(user) => format!("Signed in as {}", user.display_name),
        None => "Not signed in".to_string(),
    }
}
