// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub service: String,
    /// "ok" when at least one signing key is loaded, else "unavailable".
    pub signing_keys: String,
    pub key_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys_refreshed_at: Option<DateTime<Utc>>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness handler.
///
/// Returns 503 until signing keys are loaded: without keys no token can
/// verify. Reads the cache only; it never triggers a fetch.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let key_count = state.cache.key_count();
    let keys_ok = key_count > 0;

    let response = ReadyResponse {
        status: if keys_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            signing_keys: if keys_ok { "ok" } else { "unavailable" }.to_string(),
            key_count,
            keys_refreshed_at: state.cache.last_refreshed(),
        },
    };

    let status = if keys_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler. Always 200 while the process runs.
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
