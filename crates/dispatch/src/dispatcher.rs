use async_trait::async_trait;
use matchbook_core::Order;

use crate::error::DispatchResult;
use crate::stats::DispatchStatsSnapshot;

// Lifecycle states shared by the dispatchers
pub(crate) const STATE_IDLE: u8 = 0;
pub(crate) const STATE_RUNNING: u8 = 1;
pub(crate) const STATE_STOPPED: u8 = 2;

/// Schedules matching passes so that passes for the same security never overlap
///
/// Implementations are interchangeable: callers only see `start`,
/// `handle_orders` and `destroy`.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> DispatchResult<()>;

    /// Queue one matching pass over the unmatched orders of a single security
    ///
    /// Returns once the pass is accepted, not when it has run. Empty input
    /// is accepted and ignored.
    async fn handle_orders(&self, orders: Vec<Order>) -> DispatchResult<()>;

    /// Stop accepting work and wait for accepted passes to finish
    async fn destroy(&self) -> DispatchResult<()>;

    fn stats(&self) -> DispatchStatsSnapshot;
}
