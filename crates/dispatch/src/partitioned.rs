use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use matchbook_core::{Order, SecurityId};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{DispatchConfig, PartitionerKind};
use crate::dispatcher::{Dispatcher, STATE_IDLE, STATE_RUNNING, STATE_STOPPED};
use crate::error::{DispatchError, DispatchResult};
use crate::pass::{MatchPass, run_isolated};
use crate::stats::{DispatchStats, DispatchStatsSnapshot};

/// Strategy for distributing securities across partitions
pub trait PartitionStrategy: Send + Sync {
    /// Get the partition index for a security
    fn partition(&self, security_id: SecurityId, partitions: usize) -> usize;
}

/// Default strategy: `hash(security_id) mod N`
pub struct HashPartitioner;

impl PartitionStrategy for HashPartitioner {
    fn partition(&self, security_id: SecurityId, partitions: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        security_id.hash(&mut hasher);
        (hasher.finish() as usize) % partitions
    }
}

/// `security_id mod N`, handy when ids are dense
pub struct ModuloPartitioner;

impl PartitionStrategy for ModuloPartitioner {
    fn partition(&self, security_id: SecurityId, partitions: usize) -> usize {
        security_id as usize % partitions
    }
}

pub fn partitioner(kind: PartitionerKind) -> Arc<dyn PartitionStrategy> {
    match kind {
        PartitionerKind::Hash => Arc::new(HashPartitioner),
        PartitionerKind::Modulo => Arc::new(ModuloPartitioner),
    }
}

/// One published batch
#[derive(Debug)]
struct PassEvent {
    sequence: u64,
    security_id: SecurityId,
    orders: Vec<Order>,
}

/// Per-partition progress, readable while consumers run
#[derive(Debug, Default)]
struct LaneProgress {
    processed: AtomicU64,
    last_sequence: AtomicU64,
}

/// Fixed consumers fed by bounded lanes
///
/// Each security maps to exactly one partition and each partition has one
/// consumer task reading one bounded channel, so passes for a security run
/// one at a time in the order they were published. Publishing waits for a
/// free slot when the lane is full; with a publish timeout configured the
/// wait gives up with [`DispatchError::Backpressure`] instead.
pub struct PartitionedDispatcher {
    pass: Arc<MatchPass>,
    strategy: Arc<dyn PartitionStrategy>,
    partitions: usize,
    lane_capacity: usize,
    publish_timeout: Option<Duration>,
    /// security -> partition, filled on first publish
    assignments: DashMap<SecurityId, usize>,
    lanes: RwLock<Vec<mpsc::Sender<PassEvent>>>,
    consumers: Mutex<Vec<JoinHandle<()>>>,
    progress: Arc<Vec<LaneProgress>>,
    sequence: AtomicU64,
    stats: Arc<DispatchStats>,
    state: AtomicU8,
}

impl PartitionedDispatcher {
    pub fn new(config: &DispatchConfig, pass: Arc<MatchPass>) -> Self {
        Self::with_strategy(config, partitioner(config.partitioner), pass)
    }

    pub fn with_strategy(
        config: &DispatchConfig,
        strategy: Arc<dyn PartitionStrategy>,
        pass: Arc<MatchPass>,
    ) -> Self {
        let partitions = config.partitions.max(1);
        Self {
            pass,
            strategy,
            partitions,
            lane_capacity: config.lane_capacity(),
            publish_timeout: config.publish_timeout(),
            assignments: DashMap::new(),
            lanes: RwLock::new(Vec::new()),
            consumers: Mutex::new(Vec::new()),
            progress: Arc::new((0..partitions).map(|_| LaneProgress::default()).collect()),
            sequence: AtomicU64::new(0),
            stats: Arc::new(DispatchStats::new()),
            state: AtomicU8::new(STATE_IDLE),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn lane_capacity(&self) -> usize {
        self.lane_capacity
    }

    /// Partition a security is routed to
    pub fn partition_of(&self, security_id: SecurityId) -> usize {
        *self
            .assignments
            .entry(security_id)
            .or_insert_with(|| self.strategy.partition(security_id, self.partitions) % self.partitions)
    }

    /// Passes finished by each partition's consumer
    pub fn processed_per_partition(&self) -> Vec<u64> {
        self.progress
            .iter()
            .map(|p| p.processed.load(Ordering::Acquire))
            .collect()
    }

    /// Sequence of the last event each consumer finished, 0 when none
    pub fn last_sequence_per_partition(&self) -> Vec<u64> {
        self.progress
            .iter()
            .map(|p| p.last_sequence.load(Ordering::Acquire))
            .collect()
    }

    fn spawn_consumer(
        &self,
        partition: usize,
        mut receiver: mpsc::Receiver<PassEvent>,
    ) -> JoinHandle<()> {
        let pass = Arc::clone(&self.pass);
        let stats = Arc::clone(&self.stats);
        let progress = Arc::clone(&self.progress);

        tokio::spawn(async move {
            debug!("partition {} consumer started", partition);

            while let Some(event) = receiver.recv().await {
                run_isolated(Arc::clone(&pass), &stats, event.security_id, event.orders).await;

                let lane = &progress[partition];
                lane.last_sequence.store(event.sequence, Ordering::Release);
                lane.processed.fetch_add(1, Ordering::AcqRel);
            }

            debug!("partition {} consumer drained and stopped", partition);
        })
    }
}

#[async_trait]
impl Dispatcher for PartitionedDispatcher {
    fn name(&self) -> &str {
        "PartitionedDispatcher"
    }

    async fn start(&self) -> DispatchResult<()> {
        // State flips and lanes appear together under the lanes lock
        let mut lanes = self.lanes.write();
        match self.state.compare_exchange(
            STATE_IDLE,
            STATE_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(STATE_RUNNING) => return Ok(()),
            Err(_) => return Err(DispatchError::ShutDown),
        }

        let mut consumers = Vec::with_capacity(self.partitions);
        for partition in 0..self.partitions {
            let (sender, receiver) = mpsc::channel(self.lane_capacity);
            lanes.push(sender);
            consumers.push(self.spawn_consumer(partition, receiver));
        }
        *self.consumers.lock() = consumers;
        drop(lanes);

        info!(
            "PartitionedDispatcher started: {} partitions, {} slots each",
            self.partitions, self.lane_capacity
        );
        Ok(())
    }

    async fn handle_orders(&self, orders: Vec<Order>) -> DispatchResult<()> {
        let (security_id, partition, sender) = {
            // start and destroy change state under the write lock
            let lanes = self.lanes.read();
            match self.state.load(Ordering::Acquire) {
                STATE_RUNNING => {}
                STATE_IDLE => return Err(DispatchError::NotStarted),
                _ => return Err(DispatchError::ShutDown),
            }
            let Some(security_id) = orders.first().map(|o| o.security_id) else {
                return Ok(());
            };
            let partition = self.partition_of(security_id);
            let sender = lanes.get(partition).cloned().ok_or(DispatchError::ShutDown)?;
            (security_id, partition, sender)
        };

        let event = PassEvent {
            sequence: self.sequence.fetch_add(1, Ordering::AcqRel) + 1,
            security_id,
            orders,
        };
        let sequence = event.sequence;

        let sent = match self.publish_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, sender.send(event)).await {
                Ok(sent) => sent,
                Err(_) => {
                    warn!(
                        "partition {} full for {:?}, security {} not published",
                        partition, timeout, security_id
                    );
                    return Err(DispatchError::Backpressure {
                        security_id,
                        partition,
                    });
                }
            },
            None => sender.send(event).await,
        };
        sent.map_err(|_| DispatchError::ShutDown)?;

        self.stats.record_submitted();
        debug!(
            "published #{} for security {} to partition {}",
            sequence, security_id, partition
        );
        Ok(())
    }

    async fn destroy(&self) -> DispatchResult<()> {
        {
            let mut lanes = self.lanes.write();
            if self.state.swap(STATE_STOPPED, Ordering::AcqRel) == STATE_STOPPED {
                return Ok(());
            }
            // Dropping the senders closes the lanes; consumers finish what is queued
            lanes.clear();
        }
        let consumers = std::mem::take(&mut *self.consumers.lock());
        for consumer in consumers {
            if let Err(e) = consumer.await {
                warn!("partition consumer ended abnormally: {}", e);
            }
        }

        info!(
            "PartitionedDispatcher stopped after {} published events",
            self.sequence.load(Ordering::Acquire)
        );
        Ok(())
    }

    fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }
}
