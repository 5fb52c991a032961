//! Backend liveness polling
//!
//! The monitor probes `GET /` at startup and then on a fixed period. Every
//! failure mode (refused connection, timeout, non-2xx) collapses to
//! [`ConnectionStatus::Offline`]; there is no retry beyond the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::BackendClient;
use crate::state::ConnectionStatus;

pub struct ConnectivityMonitor {
    client: BackendClient,
    status: watch::Sender<ConnectionStatus>,
}

impl ConnectivityMonitor {
    pub fn new(client: BackendClient) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Unknown);
        Self { client, status }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Probe once and publish the result. Also used for manual rechecks.
    pub async fn check(&self) -> ConnectionStatus {
        let status = match self.client.probe().await {
            Ok(()) => ConnectionStatus::Online,
            Err(err) => {
                tracing::debug!(error = %err, "liveness probe failed");
                ConnectionStatus::Offline
            }
        };

        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::info!(?previous, current = ?status, "backend status changed");
        }
        status
    }

    /// Probe immediately, then every `period` until the handle is dropped.
    pub fn spawn(self: Arc<Self>, period: Duration) -> MonitorHandle {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.check().await;
            }
        });
        MonitorHandle { task }
    }
}

/// Owns the polling task; dropping it stops the timer.
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
