use std::sync::Arc;

use log::{debug, error, info};
use matchbook_core::{DirtySet, MatchOutcome, MatchRecord, Timestamp};
use matchbook_ports::{OrderStore, StoreError, StoreResult};

/// Writes matching results back to the order store
///
/// Trades and quantity updates of one pass are committed together through
/// [`OrderStore::commit_pass`].
pub struct PersistenceWriter {
    store: Arc<dyn OrderStore>,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Batch insert of match records, no-op on empty input
    pub async fn insert_matches(&self, trades: &[MatchRecord]) -> StoreResult<()> {
        if trades.is_empty() {
            return Ok(());
        }
        self.store.insert_match_records(trades).await
    }

    /// Single conditional update of changed orders, no-op on empty input
    ///
    /// Refused with [`StoreError::Conflict`] when any order moved past the
    /// revision the pass read.
    pub async fn update_dirty_orders(&self, dirty: &DirtySet, now: Timestamp) -> StoreResult<()> {
        if dirty.is_empty() {
            return Ok(());
        }
        self.store.update_unmatched_quantities(dirty, now).await
    }

    /// Persist a whole pass; returns whether anything was written
    pub async fn commit(&self, outcome: &MatchOutcome, now: Timestamp) -> StoreResult<bool> {
        if outcome.is_empty() {
            return Ok(false);
        }

        if let Err(e) = self
            .store
            .commit_pass(&outcome.trades, &outcome.dirty, now)
            .await
        {
            if let StoreError::Conflict(detail) = &e {
                info!(
                    "security {}: snapshot out of date, discarding {} trades: {}",
                    outcome.security_id,
                    outcome.trades.len(),
                    detail
                );
                return Err(e);
            }
            error!(
                "security {}: commit to {} failed, discarding {} trades: {}",
                outcome.security_id,
                self.store.name(),
                outcome.trades.len(),
                e
            );
            return Err(e);
        }

        debug!(
            "security {}: committed {} trades, {} order updates",
            outcome.security_id,
            outcome.trades.len(),
            outcome.dirty.len()
        );
        Ok(true)
    }
}
