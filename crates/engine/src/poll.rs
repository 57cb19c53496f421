use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use matchbook_dispatch::{DispatchError, Dispatcher};
use matchbook_ports::OrderStore;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What one poll cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Securities listed as having open orders
    pub securities: usize,
    /// Batches handed to the dispatcher
    pub dispatched: usize,
    pub fetch_failures: usize,
    pub dispatch_failures: usize,
    /// Listing the securities failed, nothing else was attempted
    pub listing_failed: bool,
}

/// Periodic driver: list securities, fetch their unmatched orders, dispatch
///
/// Failures never end the loop. A failed listing skips the cycle, a failed
/// fetch or publish skips only that security; both are retried next cycle.
pub struct PollLoop {
    store: Arc<dyn OrderStore>,
    dispatcher: Arc<dyn Dispatcher>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(
        store: Arc<dyn OrderStore>,
        dispatcher: Arc<dyn Dispatcher>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one poll cycle
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let securities = match self.store.list_securities_with_open_orders().await {
            Ok(securities) => securities,
            Err(e) => {
                warn!("listing securities from {} failed: {}", self.store.name(), e);
                report.listing_failed = true;
                return report;
            }
        };
        report.securities = securities.len();

        for security_id in securities {
            let orders = match self.store.fetch_unmatched_orders(security_id).await {
                Ok(orders) => orders,
                Err(e) => {
                    warn!(
                        "security {}: fetch failed, retrying next cycle: {}",
                        security_id, e
                    );
                    report.fetch_failures += 1;
                    continue;
                }
            };
            if orders.is_empty() {
                continue;
            }

            match self.dispatcher.handle_orders(orders).await {
                Ok(()) => report.dispatched += 1,
                Err(DispatchError::Backpressure { partition, .. }) => {
                    warn!(
                        "security {}: partition {} full, retrying next cycle",
                        security_id, partition
                    );
                    report.dispatch_failures += 1;
                }
                Err(e) => {
                    warn!("security {}: dispatch failed: {}", security_id, e);
                    report.dispatch_failures += 1;
                }
            }
        }

        debug!(
            "poll cycle: {} securities, {} dispatched, {} fetch failures, {} dispatch failures",
            report.securities, report.dispatched, report.fetch_failures, report.dispatch_failures
        );
        report
    }

    /// Run `sleep(interval)` then `tick()` until the handle is stopped
    ///
    /// A cycle already in progress finishes before the loop exits.
    pub fn spawn(self: Arc<Self>) -> PollHandle {
        let (shutdown, mut signal) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!("poll loop started, interval {:?}", self.interval);
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = signal.changed() => {}
                }
                if *signal.borrow() || signal.has_changed().is_err() {
                    break;
                }
                self.tick().await;
            }
            info!("poll loop stopped");
        });

        PollHandle { shutdown, task }
    }
}

/// Owner of a running poll loop
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("poll loop ended abnormally: {}", e);
        }
    }
}
