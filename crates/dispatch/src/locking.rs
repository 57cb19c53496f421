use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{info, warn};
use matchbook_core::{Order, SecurityId};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinSet;

use crate::dispatcher::{Dispatcher, STATE_IDLE, STATE_RUNNING, STATE_STOPPED};
use crate::error::{DispatchError, DispatchResult};
use crate::pass::{MatchPass, run_isolated};
use crate::stats::{DispatchStats, DispatchStatsSnapshot};

/// Worker pool with one lock per security
///
/// Every accepted batch becomes a task. A task takes its security's lock,
/// then one of `worker_pool_size` permits, then runs the pass. Passes for
/// different securities run in parallel up to the pool size; passes for the
/// same security run one at a time. Submission never waits.
pub struct LockingDispatcher {
    pass: Arc<MatchPass>,
    /// Created on first use, kept for the life of the dispatcher
    locks: DashMap<SecurityId, Arc<AsyncMutex<()>>>,
    permits: Arc<Semaphore>,
    pool_size: usize,
    tasks: Mutex<JoinSet<()>>,
    stats: Arc<DispatchStats>,
    state: AtomicU8,
}

impl LockingDispatcher {
    pub fn new(worker_pool_size: usize, pass: Arc<MatchPass>) -> Self {
        let pool_size = worker_pool_size.max(1);
        Self {
            pass,
            locks: DashMap::new(),
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            tasks: Mutex::new(JoinSet::new()),
            stats: Arc::new(DispatchStats::new()),
            state: AtomicU8::new(STATE_IDLE),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of securities that have been given a lock so far
    pub fn tracked_securities(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, security_id: SecurityId) -> Arc<AsyncMutex<()>> {
        self.locks
            .entry(security_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[async_trait]
impl Dispatcher for LockingDispatcher {
    fn name(&self) -> &str {
        "LockingDispatcher"
    }

    async fn start(&self) -> DispatchResult<()> {
        match self.state.compare_exchange(
            STATE_IDLE,
            STATE_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!("LockingDispatcher started with {} workers", self.pool_size);
                Ok(())
            }
            Err(STATE_RUNNING) => Ok(()),
            Err(_) => Err(DispatchError::ShutDown),
        }
    }

    async fn handle_orders(&self, orders: Vec<Order>) -> DispatchResult<()> {
        // Checked under the task lock so destroy cannot take the set in between
        let mut tasks = self.tasks.lock();
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => {}
            STATE_IDLE => return Err(DispatchError::NotStarted),
            _ => return Err(DispatchError::ShutDown),
        }
        let Some(security_id) = orders.first().map(|o| o.security_id) else {
            return Ok(());
        };

        let lock = self.lock_for(security_id);
        let permits = Arc::clone(&self.permits);
        let pass = Arc::clone(&self.pass);
        let stats = Arc::clone(&self.stats);
        self.stats.record_submitted();

        // Reap finished tasks so the set does not grow without bound
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let _guard = lock.lock().await;
            let Ok(_permit) = permits.acquire_owned().await else {
                stats.record_result(&Err(DispatchError::ShutDown));
                return;
            };
            run_isolated(pass, &stats, security_id, orders).await;
        });

        Ok(())
    }

    async fn destroy(&self) -> DispatchResult<()> {
        let mut tasks = {
            let mut guard = self.tasks.lock();
            if self.state.swap(STATE_STOPPED, Ordering::AcqRel) == STATE_STOPPED {
                return Ok(());
            }
            std::mem::take(&mut *guard)
        };
        let pending = tasks.len();
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("LockingDispatcher task ended abnormally: {}", e);
            }
        }

        info!(
            "LockingDispatcher stopped after draining {} tasks ({} securities seen)",
            pending,
            self.locks.len()
        );
        Ok(())
    }

    fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }
}
