// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`Settings`] loaded from
//! them at startup. Invalid values are fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GOOGLE_CLIENT_ID` | OAuth client ID tokens must be issued for | Required |
//! | `AUTH_ISSUERS` | Comma-separated accepted `iss` values | `accounts.google.com,https://accounts.google.com` |
//! | `AUTH_CERTS_URL` | Signing-key (JWK set) endpoint | `https://www.googleapis.com/oauth2/v3/certs` |
//! | `AUTH_REALM` | Realm in the `WWW-Authenticate` challenge | `jwt` |
//! | `KEY_REFRESH_INTERVAL_SECS` | Seconds between key refreshes | `3600` |
//! | `KEY_REFRESH_CHECK_SECS` | Seconds between refresh checks | `300` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::time::Duration;

use crate::auth::certs::{DEFAULT_CERTS_URL, DEFAULT_REFRESH_INTERVAL};
use crate::auth::refresher::DEFAULT_CHECK_INTERVAL;
use crate::auth::verifier::GOOGLE_ISSUERS;
use crate::error::ConfigError;

pub const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const ISSUERS_ENV: &str = "AUTH_ISSUERS";
pub const CERTS_URL_ENV: &str = "AUTH_CERTS_URL";
pub const REALM_ENV: &str = "AUTH_REALM";
pub const REFRESH_INTERVAL_ENV: &str = "KEY_REFRESH_INTERVAL_SECS";
pub const REFRESH_CHECK_ENV: &str = "KEY_REFRESH_CHECK_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub issuers: Vec<String>,
    pub certs_url: String,
    /// `None` means the guard's default realm.
    pub realm: Option<String>,
    pub refresh_interval: Duration,
    pub refresh_check_interval: Duration,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup(CLIENT_ID_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingAudience)?;

        let issuers = match lookup(ISSUERS_ENV) {
            Some(raw) => {
                let issuers: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if issuers.is_empty() {
                    return Err(ConfigError::MissingIssuer);
                }
                issuers
            }
            None => GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect(),
        };

        let certs_url = lookup(CERTS_URL_ENV).unwrap_or_else(|| DEFAULT_CERTS_URL.to_string());
        let realm = lookup(REALM_ENV);

        let refresh_interval =
            seconds(&lookup, REFRESH_INTERVAL_ENV)?.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        let refresh_check_interval =
            seconds(&lookup, REFRESH_CHECK_ENV)?.unwrap_or(DEFAULT_CHECK_INTERVAL);

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                var: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let ip: IpAddr = host.parse().map_err(|e: AddrParseError| ConfigError::InvalidValue {
            var: HOST_ENV,
            reason: e.to_string(),
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            client_id,
            issuers,
            certs_url,
            realm,
            refresh_interval,
            refresh_check_interval,
            bind_addr,
            log_format,
        })
    }
}

/// Read a positive number of seconds.
fn seconds<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
        }),
    }
}
