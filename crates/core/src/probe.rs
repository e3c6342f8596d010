//! Connectivity probe
//!
//! One bounded health request against the backend. Safe to call repeatedly;
//! the manual "retry" button simply calls it again.

use std::sync::Arc;
use std::time::Duration;

use smartcal_domain::{ConnectivityFailure, ConnectivityStatus, ProbeReport};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::ports::HealthCheck;

pub struct ConnectivityProbe {
    health: Arc<dyn HealthCheck>,
    timeout: Duration,
    status: watch::Sender<ConnectivityStatus>,
}

impl ConnectivityProbe {
    pub fn new(health: Arc<dyn HealthCheck>, timeout: Duration) -> Self {
        let (status, _) = watch::channel(ConnectivityStatus::Checking);
        Self { health, timeout, status }
    }

    /// Run one health request and publish the classified result.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> ProbeReport {
        self.status.send_replace(ConnectivityStatus::Checking);

        let report = match tokio::time::timeout(self.timeout, self.health.check_health()).await {
            Ok(Ok(detail)) => ProbeReport::connected(detail),
            Ok(Err(failure)) => ProbeReport::unreachable(failure),
            Err(_) => ProbeReport::unreachable(ConnectivityFailure::Timeout),
        };

        if report.reachable {
            info!(detail = %report.detail, "backend reachable");
        } else {
            warn!(detail = %report.detail, "backend unreachable");
        }

        self.status.send_replace(report.status());
        report
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }
}
