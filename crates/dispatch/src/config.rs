use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which dispatch strategy schedules matching passes
///
/// The two strategies are alternatives: run exactly one per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Worker pool with one lock per security
    Locking,
    /// Fixed consumers fed by bounded per-partition lanes
    #[default]
    Partitioned,
}

/// How securities are assigned to partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionerKind {
    #[default]
    Hash,
    Modulo,
}

/// Dispatch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    /// Concurrent passes allowed by the locking dispatcher
    pub worker_pool_size: usize,
    /// Consumer count for the partitioned dispatcher
    pub partitions: usize,
    /// Total slots across all partition lanes
    pub ring_capacity: usize,
    pub partitioner: PartitionerKind,
    /// Give up publishing after this long; wait forever when unset
    pub publish_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Partitioned,
            worker_pool_size: 10,
            partitions: 10,
            ring_capacity: 4096,
            partitioner: PartitionerKind::Hash,
            publish_timeout_ms: None,
        }
    }
}

impl DispatchConfig {
    pub fn locking(worker_pool_size: usize) -> Self {
        Self {
            mode: DispatchMode::Locking,
            worker_pool_size,
            ..Self::default()
        }
    }

    pub fn partitioned(partitions: usize, ring_capacity: usize) -> Self {
        Self {
            mode: DispatchMode::Partitioned,
            partitions,
            ring_capacity,
            ..Self::default()
        }
    }

    pub fn with_partitioner(mut self, partitioner: PartitionerKind) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Slots per partition lane, never less than one
    pub fn lane_capacity(&self) -> usize {
        (self.ring_capacity / self.partitions.max(1)).max(1)
    }

    pub fn publish_timeout(&self) -> Option<Duration> {
        self.publish_timeout_ms.map(Duration::from_millis)
    }
}
