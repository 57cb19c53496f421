use matchbook_core::SecurityId;
use matchbook_ports::{MatchingError, StoreError};
use thiserror::Error;

/// Errors raised while dispatching or running matching passes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatcher has not been started")]
    NotStarted,

    #[error("Dispatcher is shut down")]
    ShutDown,

    #[error("Partition {partition} is full, orders for security {security_id} not published")]
    Backpressure {
        security_id: SecurityId,
        partition: usize,
    },

    #[error("Matching pass for security {security_id} panicked: {detail}")]
    Panicked {
        security_id: SecurityId,
        detail: String,
    },

    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// The pass matched a snapshot that another pass had already committed over
    pub fn is_stale(&self) -> bool {
        matches!(self, DispatchError::Store(StoreError::Conflict(_)))
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
