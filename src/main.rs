// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use id_token_guard::api::router;
use id_token_guard::auth::CertificateRefresher;
use id_token_guard::config::{LogFormat, Settings, DEFAULT_LOG_FILTER};
use id_token_guard::state::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    let state = match AppState::from_settings(&settings) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Invalid authentication configuration");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let refresher = CertificateRefresher::new(state.cache.clone())
        .with_check_interval(settings.refresh_check_interval)
        .spawn(shutdown.clone());

    let listener = match tokio::net::TcpListener::bind(settings.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %settings.bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %settings.bind_addr, "id-token-guard listening");

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = server_shutdown.cancelled() => {},
            }
        })
        .await;

    shutdown.cancel();
    let _ = refresher.await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
