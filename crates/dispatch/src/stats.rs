use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::DispatchResult;
use crate::pass::PassReport;

/// Counters shared by a dispatcher and its workers
#[derive(Debug, Default)]
pub struct DispatchStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    stale: AtomicU64,
    panicked: AtomicU64,
    trades: AtomicU64,
    orders_updated: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub passes_submitted: u64,
    pub passes_completed: u64,
    pub passes_failed: u64,
    /// Failed passes refused because their snapshot was out of date
    pub passes_stale: u64,
    pub passes_panicked: u64,
    pub trades: u64,
    pub orders_updated: u64,
}

impl DispatchStatsSnapshot {
    /// Passes accepted but not yet finished
    pub fn in_flight(&self) -> u64 {
        self.passes_submitted
            .saturating_sub(self.passes_completed + self.passes_failed + self.passes_panicked)
    }
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result(&self, result: &DispatchResult<PassReport>) {
        match result {
            Ok(report) => {
                self.trades.fetch_add(report.trades as u64, Ordering::Relaxed);
                self.orders_updated
                    .fetch_add(report.orders_updated as u64, Ordering::Relaxed);
                self.completed.fetch_add(1, Ordering::Release);
            }
            Err(e) => {
                if e.is_stale() {
                    self.stale.fetch_add(1, Ordering::Relaxed);
                }
                self.failed.fetch_add(1, Ordering::Release);
            }
        }
    }

    pub fn record_panic(&self) {
        self.panicked.fetch_add(1, Ordering::Release);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            passes_submitted: self.submitted.load(Ordering::Acquire),
            passes_completed: self.completed.load(Ordering::Acquire),
            passes_failed: self.failed.load(Ordering::Acquire),
            passes_stale: self.stale.load(Ordering::Relaxed),
            passes_panicked: self.panicked.load(Ordering::Acquire),
            trades: self.trades.load(Ordering::Relaxed),
            orders_updated: self.orders_updated.load(Ordering::Relaxed),
        }
    }
}
