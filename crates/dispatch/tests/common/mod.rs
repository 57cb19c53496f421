#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use matchbook_clock::SystemClock;
use matchbook_core::{
    DirtySet, MatchOutcome, MatchRecord, Order, OrderId, Position, SecurityId, SortedBook,
    Timestamp,
};
use matchbook_dispatch::MatchPass;
use matchbook_matching::{ContinuousDoubleAuction, MatchingAlgorithm, MatchingResult};
use matchbook_ports::{OrderStore, StoreResult};
use matchbook_store::InMemoryOrderStore;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;

pub const PANIC_SECURITY: SecurityId = 13;

/// Store that slows commits down and records how they overlap
pub struct InstrumentedStore {
    pub inner: InMemoryOrderStore,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    active: Mutex<HashMap<SecurityId, usize>>,
    active_total: AtomicUsize,
    max_total: AtomicUsize,
    overlap: AtomicBool,
    entered: AtomicUsize,
    commit_order: Mutex<Vec<(SecurityId, OrderId)>>,
}

impl InstrumentedStore {
    pub fn new(inner: InMemoryOrderStore, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            gate: None,
            active: Mutex::new(HashMap::new()),
            active_total: AtomicUsize::new(0),
            max_total: AtomicUsize::new(0),
            overlap: AtomicBool::new(false),
            entered: AtomicUsize::new(0),
            commit_order: Mutex::new(Vec::new()),
        }
    }

    /// Commits wait for a permit from the returned semaphore
    pub fn gated(inner: InMemoryOrderStore) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut store = Self::new(inner, Duration::ZERO);
        store.gate = Some(Arc::clone(&gate));
        (store, gate)
    }

    /// Two commits for the same security were in progress at once
    pub fn saw_same_security_overlap(&self) -> bool {
        self.overlap.load(Ordering::Acquire)
    }

    pub fn max_concurrent_commits(&self) -> usize {
        self.max_total.load(Ordering::Acquire)
    }

    pub fn commits_entered(&self) -> usize {
        self.entered.load(Ordering::Acquire)
    }

    /// `(security, first long order id)` per commit, in commit order
    pub fn commit_order(&self) -> Vec<(SecurityId, OrderId)> {
        self.commit_order.lock().clone()
    }
}

#[async_trait]
impl OrderStore for InstrumentedStore {
    async fn list_securities_with_open_orders(&self) -> StoreResult<Vec<SecurityId>> {
        self.inner.list_securities_with_open_orders().await
    }

    async fn fetch_unmatched_orders(&self, security_id: SecurityId) -> StoreResult<Vec<Order>> {
        self.inner.fetch_unmatched_orders(security_id).await
    }

    async fn insert_match_records(&self, records: &[MatchRecord]) -> StoreResult<()> {
        self.inner.insert_match_records(records).await
    }

    async fn update_unmatched_quantities(
        &self,
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        self.inner.update_unmatched_quantities(updates, now).await
    }

    async fn commit_pass(
        &self,
        records: &[MatchRecord],
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        let security_id = records.first().map(|r| r.security_id).unwrap_or_default();
        let long_id = records.first().map(|r| r.long_order_id).unwrap_or_default();
        self.entered.fetch_add(1, Ordering::AcqRel);

        {
            let mut active = self.active.lock();
            let count = active.entry(security_id).or_default();
            *count += 1;
            if *count > 1 {
                self.overlap.store(true, Ordering::Release);
            }
        }
        let total = self.active_total.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_total.fetch_max(total, Ordering::AcqRel);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.commit_order.lock().push((security_id, long_id));
        let result = self.inner.commit_pass(records, updates, now).await;

        self.active_total.fetch_sub(1, Ordering::AcqRel);
        if let Some(count) = self.active.lock().get_mut(&security_id) {
            *count -= 1;
        }
        result
    }
}

/// Continuous double auction that panics on one security
pub struct PanicOn(pub SecurityId);

impl MatchingAlgorithm for PanicOn {
    fn name(&self) -> &str {
        "PanicOn"
    }

    fn match_book(&self, book: SortedBook, now: Timestamp) -> MatchingResult<MatchOutcome> {
        if book.security_id == self.0 {
            panic!("boom on security {}", self.0);
        }
        ContinuousDoubleAuction::new().match_book(book, now)
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A crossing pair for `security_id`; ids are `base` (long) and `base + 1` (short)
pub fn crossing_pair(security_id: SecurityId, base: OrderId) -> Vec<Order> {
    let t = Utc::now();
    vec![
        Order::new_with_time(base, security_id, Position::Long, dec!(100), 5, t),
        Order::new_with_time(base + 1, security_id, Position::Short, dec!(99), 5, t),
    ]
}

pub fn pass_over(store: Arc<dyn OrderStore>) -> Arc<MatchPass> {
    Arc::new(MatchPass::new(
        Arc::new(ContinuousDoubleAuction::new()),
        Arc::new(SystemClock::new()),
        store,
    ))
}

pub fn panicking_pass_over(store: Arc<dyn OrderStore>) -> Arc<MatchPass> {
    Arc::new(MatchPass::new(
        Arc::new(PanicOn(PANIC_SECURITY)),
        Arc::new(SystemClock::new()),
        store,
    ))
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
