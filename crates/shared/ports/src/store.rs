use async_trait::async_trait;
use matchbook_core::{DirtySet, MatchRecord, Order, SecurityId, Timestamp};

use crate::error::StoreResult;

/// Port for the persistent order store
///
/// The store is the source of truth. The matcher reads unmatched orders from
/// it and writes back match records and remaining quantities.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Distinct securities that still have orders with `unmatched != 0`
    async fn list_securities_with_open_orders(&self) -> StoreResult<Vec<SecurityId>>;

    /// All orders of a security with `unmatched != 0`
    async fn fetch_unmatched_orders(&self, security_id: SecurityId) -> StoreResult<Vec<Order>>;

    /// Insert match records as a single batch
    async fn insert_match_records(&self, records: &[MatchRecord]) -> StoreResult<()>;

    /// Write new remaining quantities as a single batch, bumping revision
    /// and update time on every touched row
    ///
    /// Conditional: every order must still be at the revision recorded in
    /// `updates`, otherwise nothing is written and [`crate::StoreError::Conflict`]
    /// is returned.
    async fn update_unmatched_quantities(
        &self,
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()>;

    /// Persist the result of one pass
    ///
    /// The default runs the conditional update first so a stale pass never
    /// inserts its records. Stores with transactions override this so that
    /// either both land or neither does.
    async fn commit_pass(
        &self,
        records: &[MatchRecord],
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        if !updates.is_empty() {
            self.update_unmatched_quantities(updates, now).await?;
        }
        if !records.is_empty() {
            self.insert_match_records(records).await?;
        }
        Ok(())
    }

    /// Get the store's name/identifier for debugging
    fn name(&self) -> &str {
        "OrderStore"
    }
}
