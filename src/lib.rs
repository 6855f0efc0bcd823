// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! id-token-guard - Bearer ID token authentication for Axum
//!
//! Verifies identity-provider ID tokens (Google by default) against a
//! signing-key set cached in process and rotated in the background, then
//! exposes the caller as a normalized [`auth::Identity`].
//!
//! ## Modules
//!
//! - `auth` - Key cache, token verification, middleware and guard
//! - `api` - HTTP routes of the bundled server
//! - `config` - Environment configuration
//! - `error` - Fatal setup errors

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
