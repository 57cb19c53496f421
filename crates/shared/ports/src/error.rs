use matchbook_core::{OrderId, SecurityId};
use thiserror::Error;

/// Domain-level errors for matching passes
///
/// All variants are programming errors: the pass is aborted before anything
/// is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Invariant violated on order {order_id}: {detail}")]
    InvariantViolation { order_id: OrderId, detail: String },

    #[error("Order {order_id} does not belong in book for security {security_id}: {detail}")]
    MixedBook {
        security_id: SecurityId,
        order_id: OrderId,
        detail: String,
    },
}

pub type MatchingResult<T> = std::result::Result<T, MatchingError>;

/// Errors raised by an order store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Insert failed: {0}")]
    Insert(String),

    #[error("Update failed: {0}")]
    Update(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// An order moved on since the pass read it; nothing was written
    #[error("Stale snapshot: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
