//! Matchbook Dispatch
//!
//! Runs matching passes and decides how passes for different securities
//! share the machine. The one rule every strategy keeps: two passes over the
//! same security never run at the same time, because both would see the
//! same unmatched quantities and match them twice.
//!
//! - [`MatchPass`]: split, match, commit for one security
//! - [`LockingDispatcher`]: worker pool plus a lock per security
//! - [`PartitionedDispatcher`]: `N` consumers, each fed by a bounded lane,
//!   securities routed by a [`PartitionStrategy`]
//!
//! Pick one per deployment with [`create_dispatcher`].

mod config;
mod dispatcher;
mod error;
mod factory;
mod locking;
mod partitioned;
mod pass;
mod stats;
mod writer;

pub use config::{DispatchConfig, DispatchMode, PartitionerKind};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use factory::create_dispatcher;
pub use locking::LockingDispatcher;
pub use partitioned::{
    HashPartitioner, ModuloPartitioner, PartitionStrategy, PartitionedDispatcher, partitioner,
};
pub use pass::{MatchPass, PassReport};
pub use stats::{DispatchStats, DispatchStatsSnapshot};
pub use writer::PersistenceWriter;
