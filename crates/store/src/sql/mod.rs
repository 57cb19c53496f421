//! SQL-backed order store
//!
//! [`SqlOrderStore`] owns the statement text and row decoding. Talking to a
//! database is delegated to a [`SqlExecutor`].

mod executor;
mod row;
pub mod statements;

pub use executor::{Row, SqlExecutor, Statement};

use async_trait::async_trait;
use log::{debug, warn};
use matchbook_core::{DirtySet, MatchRecord, Order, SecurityId, Timestamp};
use matchbook_ports::{OrderStore, StoreError, StoreResult};

use row::{order_from_row, security_from_row};

pub struct SqlOrderStore<E> {
    executor: E,
}

impl<E: SqlExecutor> SqlOrderStore<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn run_batch(
        &self,
        batch: Vec<Statement>,
        wrap: fn(String) -> StoreError,
    ) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let affected = self.executor.execute_batch(&batch).await.map_err(|e| match e {
            StoreError::Conflict(_) => {
                debug!("batch of {} statements hit a stale row: {}", batch.len(), e);
                e
            }
            e => {
                warn!("batch of {} statements failed: {}", batch.len(), e);
                wrap(e.to_string())
            }
        })?;
        debug!("batch of {} statements affected {} rows", batch.len(), affected);
        Ok(())
    }
}

fn insert_statement(records: &[MatchRecord]) -> Option<Statement> {
    statements::insert_match_records(records).map(Statement::new)
}

/// The update must touch every dirty row, fewer means a stale snapshot
fn update_statement(updates: &DirtySet, now: Timestamp) -> Option<Statement> {
    statements::update_unmatched(updates, now)
        .map(|sql| Statement::expecting(sql, updates.len() as u64))
}

#[async_trait]
impl<E: SqlExecutor> OrderStore for SqlOrderStore<E> {
    async fn list_securities_with_open_orders(&self) -> StoreResult<Vec<SecurityId>> {
        let rows = self
            .executor
            .query(&statements::open_securities_query())
            .await?;
        rows.into_iter().map(security_from_row).collect()
    }

    async fn fetch_unmatched_orders(&self, security_id: SecurityId) -> StoreResult<Vec<Order>> {
        let rows = self
            .executor
            .query(&statements::unmatched_orders_query(security_id))
            .await?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn insert_match_records(&self, records: &[MatchRecord]) -> StoreResult<()> {
        let batch = insert_statement(records).into_iter().collect();
        self.run_batch(batch, StoreError::Insert).await
    }

    async fn update_unmatched_quantities(
        &self,
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        let batch = update_statement(updates, now).into_iter().collect();
        self.run_batch(batch, StoreError::Update).await
    }

    async fn commit_pass(
        &self,
        records: &[MatchRecord],
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        let batch: Vec<Statement> = update_statement(updates, now)
            .into_iter()
            .chain(insert_statement(records))
            .collect();
        self.run_batch(batch, StoreError::Commit).await
    }

    fn name(&self) -> &str {
        "SqlOrderStore"
    }
}
