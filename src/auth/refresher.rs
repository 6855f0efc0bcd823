// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signing-Key Refresher
//!
//! Background task that keeps the [`CertificateCache`] current.
//!
//! ## Strategy
//!
//! One refresh runs at startup. After that the task wakes every
//! `check_interval` (default 5 min) and refreshes only when the cache's
//! next-refresh time has passed. Timers stall while a host is suspended, so
//! the short tick compares wall-clock time instead of trusting one long
//! sleep to fire on schedule. A failed refresh marks the cache due, which
//! makes the following tick retry.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`, following the same pattern as
//! the other background pollers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::certs::CertificateCache;

/// Default interval between refresh checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Periodic refresh driver for a shared certificate cache.
pub struct CertificateRefresher {
    cache: Arc<CertificateCache>,
    check_interval: Duration,
}

impl CertificateRefresher {
    pub fn new(cache: Arc<CertificateCache>) -> Self {
        Self {
            cache,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Create with a custom check interval.
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run the refresh loop until the cancellation token is triggered.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            url = %self.cache.certs_url(),
            check_interval_secs = self.check_interval.as_secs(),
            refresh_interval_secs = self.cache.refresh_interval().as_secs(),
            "Signing key refresher starting"
        );

        // Errors are logged inside refresh(); the cache is left due.
        tokio::select! {
            _ = self.cache.refresh() => {}
            _ = shutdown.cancelled() => {
                info!("Signing key refresher cancelled during startup");
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the startup refresh covers it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.cache.refresh_if_due().await {
                        debug!(
                            next_refresh = %self.cache.next_refresh(),
                            "Signing keys still fresh"
                        );
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Signing key refresher shutting down");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::certs::DEFAULT_CERTS_URL;

    #[test]
    fn default_check_interval_is_shorter_than_refresh_interval() {
        let cache = Arc::new(CertificateCache::new(DEFAULT_CERTS_URL).unwrap());
        let refresher = CertificateRefresher::new(cache.clone());
        assert!(refresher.check_interval < cache.refresh_interval());
    }

    #[test]
    fn custom_check_interval() {
        let cache = Arc::new(CertificateCache::new(DEFAULT_CERTS_URL).unwrap());
        let refresher =
            CertificateRefresher::new(cache).with_check_interval(Duration::from_secs(1));
        assert_eq!(refresher.check_interval, Duration::from_secs(1));
    }
}
