//! Background connectivity polling, owned by whoever starts it.

use crate::remote::{AttendanceService, ConnectionStatus, Connectivity};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a running monitor. Dropping it stops the task as well.
pub struct MonitorHandle {
    status: watch::Receiver<Option<ConnectionStatus>>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Most recent probe result, `None` before the first probe completes.
    pub fn latest(&self) -> Option<ConnectionStatus> {
        self.status.borrow().clone()
    }

    /// Receiver notified after every probe.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConnectionStatus>> {
        self.status.clone()
    }

    /// Signal the task and wait until it has exited.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Probe `service` right away and then every `every`. Each probe is cut
/// off after `probe_timeout` and reported as `TimedOut`. Probes never
/// touch the record store, so they run alongside submits and queries.
pub fn spawn_monitor(
    service: Arc<dyn AttendanceService>,
    every: Duration,
    probe_timeout: Duration,
) -> MonitorHandle {
    let (status_tx, status_rx) = watch::channel(None);
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            let probe = tokio::time::timeout(probe_timeout, service.probe(probe_timeout));
            let status = tokio::select! {
                _ = stop_rx.changed() => break,
                res = probe => {
                    res.unwrap_or_else(|_| ConnectionStatus::new(Connectivity::TimedOut))
                }
            };

            debug!(state = ?status.state, "connectivity probed");
            status_tx.send_replace(Some(status));
        }

        info!("connectivity monitor stopped");
    });

    MonitorHandle {
        status: status_rx,
        stop: stop_tx,
        task: Some(task),
    }
}
