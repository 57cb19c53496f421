use std::sync::Arc;

use crate::config::{DispatchConfig, DispatchMode};
use crate::dispatcher::Dispatcher;
use crate::locking::LockingDispatcher;
use crate::partitioned::PartitionedDispatcher;
use crate::pass::MatchPass;

/// Build the dispatcher selected by `config.mode`
pub fn create_dispatcher(config: &DispatchConfig, pass: Arc<MatchPass>) -> Arc<dyn Dispatcher> {
    match config.mode {
        DispatchMode::Locking => Arc::new(LockingDispatcher::new(config.worker_pool_size, pass)),
        DispatchMode::Partitioned => Arc::new(PartitionedDispatcher::new(config, pass)),
    }
}
