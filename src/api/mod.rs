// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::Request, middleware::from_fn_with_state, routing::get, Extension, Router};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::auth::{authenticate, require_identity};
use crate::state::AppState;

pub mod health;
pub mod hello;

/// Request span carrying the path only. The query string may hold an
/// `id_token` credential and is never recorded.
pub fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Build the application router.
///
/// Authentication runs on every route; only `/api` is guarded. The guard is
/// also placed in the request extensions so the `Auth` extractor rejects
/// with the same challenge.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/hello", get(hello::hello))
        .route("/me", get(hello::me))
        .route_layer(from_fn_with_state(state.guard.clone(), require_identity));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/whoami", get(hello::whoami))
        .nest("/api", api_routes)
        .layer(from_fn_with_state(state.authenticator.clone(), authenticate))
        .layer(Extension(state.guard.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}
