use std::sync::Arc;

use async_trait::async_trait;
use matchbook_ports::StoreResult;

/// One result row keyed by upper-case column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A write statement inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    /// Rows the statement must touch for the batch to commit
    pub expected_rows: Option<u64>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            expected_rows: None,
        }
    }

    /// Statement whose affected row count is checked before commit
    pub fn expecting(sql: impl Into<String>, rows: u64) -> Self {
        Self {
            sql: sql.into(),
            expected_rows: Some(rows),
        }
    }
}

/// Connection seam for [`super::SqlOrderStore`]
///
/// Implementations wrap whatever driver the deployment uses. Statement text
/// is complete; no parameters are bound.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a query and return its rows
    async fn query(&self, sql: &str) -> StoreResult<Vec<Row>>;

    /// Run statements in order inside a single transaction
    ///
    /// Returns the total number of affected rows. When a statement's
    /// affected row count differs from its `expected_rows` the transaction
    /// is rolled back and `StoreError::Conflict` returned. On any error
    /// nothing may be left applied.
    async fn execute_batch(&self, statements: &[Statement]) -> StoreResult<u64>;
}

#[async_trait]
impl<T: SqlExecutor + ?Sized> SqlExecutor for Arc<T> {
    async fn query(&self, sql: &str) -> StoreResult<Vec<Row>> {
        (**self).query(sql).await
    }

    async fn execute_batch(&self, statements: &[Statement]) -> StoreResult<u64> {
        (**self).execute_batch(statements).await
    }
}
