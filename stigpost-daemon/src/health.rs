//! Daemon health reporting.
//!
//! `GET /healthz` answers with a [`DaemonHealth`] snapshot. The daemon has
//! a single module, so the report is the ingress status plus uptime.

use std::time::Instant;

use serde::Serialize;

use stigpost_core::types::HealthStatus;

/// Health report for the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall daemon health status.
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
}

impl DaemonHealth {
    /// Build a report from the daemon start time and current status.
    ///
    /// Also refreshes the uptime gauge so a scrape right after a health
    /// probe sees the same value.
    pub fn snapshot(start_time: Instant, status: HealthStatus) -> Self {
        let uptime_secs = start_time.elapsed().as_secs();

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(stigpost_core::metrics::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);

        Self {
            status,
            uptime_secs,
        }
    }
}
