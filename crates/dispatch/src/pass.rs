use std::sync::Arc;

use log::{debug, error, trace, warn};
use matchbook_core::{Order, SecurityId};
use matchbook_matching::split_sides;
use matchbook_ports::{Clock, MatchingAlgorithm, OrderStore};
use serde::Serialize;

use crate::error::{DispatchError, DispatchResult};
use crate::stats::DispatchStats;
use crate::writer::PersistenceWriter;

/// What one matching pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub security_id: SecurityId,
    /// Orders handed to the pass
    pub orders: usize,
    pub trades: usize,
    pub orders_updated: usize,
}

impl PassReport {
    fn idle(security_id: SecurityId, orders: usize) -> Self {
        Self {
            security_id,
            orders,
            ..Self::default()
        }
    }
}

/// Split, match and commit the unmatched orders of one security
///
/// Shared by every dispatcher. Nothing is persisted unless the whole pass
/// succeeds, and a failed commit leaves the store as it was: the next poll
/// starts again from the stored quantities. A pass over orders that another
/// pass has since updated fails with a stale-snapshot store error instead of
/// trading the same quantity twice.
pub struct MatchPass {
    algorithm: Arc<dyn MatchingAlgorithm>,
    clock: Arc<dyn Clock>,
    writer: PersistenceWriter,
}

impl MatchPass {
    pub fn new(
        algorithm: Arc<dyn MatchingAlgorithm>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            algorithm,
            clock,
            writer: PersistenceWriter::new(store),
        }
    }

    pub fn algorithm(&self) -> &dyn MatchingAlgorithm {
        self.algorithm.as_ref()
    }

    pub fn writer(&self) -> &PersistenceWriter {
        &self.writer
    }

    pub async fn run(
        &self,
        security_id: SecurityId,
        orders: Vec<Order>,
    ) -> DispatchResult<PassReport> {
        let count = orders.len();
        if orders.is_empty() {
            return Ok(PassReport::idle(security_id, 0));
        }

        let book = split_sides(security_id, orders);
        if !book.is_two_sided() {
            trace!(
                "security {}: one-sided book ({} longs, {} shorts)",
                security_id,
                book.longs.len(),
                book.shorts.len()
            );
            return Ok(PassReport::idle(security_id, count));
        }

        let now = self.clock.now();
        let outcome = self.algorithm.match_book(book, now).map_err(|e| {
            error!("security {}: matching aborted: {}", security_id, e);
            e
        })?;

        self.writer.commit(&outcome, now).await?;

        let report = PassReport {
            security_id,
            orders: count,
            trades: outcome.trades.len(),
            orders_updated: outcome.dirty.len(),
        };
        debug!(
            "security {}: pass over {} orders produced {} trades",
            security_id, report.orders, report.trades
        );
        Ok(report)
    }
}

/// Run one pass inside its own task so a panic stops at the task boundary
pub(crate) async fn run_isolated(
    pass: Arc<MatchPass>,
    stats: &DispatchStats,
    security_id: SecurityId,
    orders: Vec<Order>,
) {
    let result = tokio::spawn(async move { pass.run(security_id, orders).await }).await;

    match result {
        Ok(outcome) => stats.record_result(&outcome),
        Err(e) if e.is_panic() => {
            error!("security {}: matching pass panicked", security_id);
            stats.record_panic();
        }
        Err(e) => {
            warn!("security {}: matching pass cancelled: {}", security_id, e);
            stats.record_result(&Err(DispatchError::ShutDown));
        }
    }
}
