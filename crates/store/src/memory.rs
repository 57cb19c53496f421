use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use matchbook_core::{DirtySet, MatchRecord, Order, OrderId, SecurityId, Timestamp};
use matchbook_ports::{OrderStore, StoreError, StoreResult};
use parking_lot::Mutex;

/// One-shot failures armed by tests
#[derive(Default)]
struct Faults {
    fetch: AtomicBool,
    commit: AtomicBool,
}

impl Faults {
    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::AcqRel)
    }
}

/// In-memory order store
///
/// Thread-safe storage for orders using DashMap.
/// Suitable for simulation and testing.
pub struct InMemoryOrderStore {
    orders: Arc<DashMap<OrderId, Order>>,
    matches: Arc<Mutex<Vec<MatchRecord>>>,
    /// Serialises pass commits so trades and quantities land together
    commit_gate: Arc<Mutex<()>>,
    commits: Arc<AtomicU64>,
    faults: Arc<Faults>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        InMemoryOrderStore {
            orders: Arc::new(DashMap::new()),
            matches: Arc::new(Mutex::new(Vec::new())),
            commit_gate: Arc::new(Mutex::new(())),
            commits: Arc::new(AtomicU64::new(0)),
            faults: Arc::new(Faults::default()),
        }
    }

    /// Insert or replace an order (order entry side)
    pub fn submit(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn submit_all(&self, orders: impl IntoIterator<Item = Order>) {
        for order in orders {
            self.submit(order);
        }
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).map(|o| o.value().clone())
    }

    /// Every order of a security, matched or not, sorted by id
    pub fn orders_for(&self, security_id: SecurityId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().security_id == security_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        orders
    }

    /// All match records inserted so far, in insertion order
    pub fn matches(&self) -> Vec<MatchRecord> {
        self.matches.lock().clone()
    }

    /// Number of successful pass commits
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Acquire)
    }

    /// Make the next fetch (listing or per-security) fail
    pub fn fail_next_fetch(&self) {
        self.faults.fetch.store(true, Ordering::Release);
    }

    /// Make the next pass commit fail without writing anything
    pub fn fail_next_commit(&self) {
        self.faults.commit.store(true, Ordering::Release);
    }

    /// Check every update before touching any row
    ///
    /// Each order must still be at the revision the pass read, so passes
    /// built from a stale snapshot are refused whole.
    fn validate_updates(&self, updates: &DirtySet) -> StoreResult<()> {
        for (order_id, entry) in updates.entries() {
            let order = self
                .orders
                .get(&order_id)
                .ok_or(StoreError::UnknownOrder(order_id))?;
            if order.revision != entry.revision {
                return Err(StoreError::Conflict(format!(
                    "order {} is at revision {}, pass read revision {}",
                    order_id, order.revision, entry.revision
                )));
            }
            if entry.unmatched > order.quantity {
                return Err(StoreError::Update(format!(
                    "order {} cannot have {} unmatched out of {}",
                    order_id, entry.unmatched, order.quantity
                )));
            }
        }
        Ok(())
    }

    fn apply_updates(&self, updates: &DirtySet, now: Timestamp) {
        for (order_id, unmatched) in updates.iter() {
            if let Some(mut order) = self.orders.get_mut(&order_id) {
                order.unmatched = unmatched;
                order.revision += 1;
                order.update_time = now;
            }
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryOrderStore {
    fn clone(&self) -> Self {
        InMemoryOrderStore {
            orders: Arc::clone(&self.orders),
            matches: Arc::clone(&self.matches),
            commit_gate: Arc::clone(&self.commit_gate),
            commits: Arc::clone(&self.commits),
            faults: Arc::clone(&self.faults),
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn list_securities_with_open_orders(&self) -> StoreResult<Vec<SecurityId>> {
        if Faults::take(&self.faults.fetch) {
            return Err(StoreError::Fetch("injected listing failure".to_string()));
        }

        let securities: BTreeSet<SecurityId> = self
            .orders
            .iter()
            .filter(|entry| entry.value().unmatched != 0)
            .map(|entry| entry.value().security_id)
            .collect();

        Ok(securities.into_iter().collect())
    }

    async fn fetch_unmatched_orders(&self, security_id: SecurityId) -> StoreResult<Vec<Order>> {
        if Faults::take(&self.faults.fetch) {
            return Err(StoreError::Fetch(format!(
                "injected fetch failure for security {}",
                security_id
            )));
        }

        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                order.security_id == security_id && order.unmatched != 0
            })
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn insert_match_records(&self, records: &[MatchRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.matches.lock().extend_from_slice(records);
        Ok(())
    }

    async fn update_unmatched_quantities(
        &self,
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let _gate = self.commit_gate.lock();
        self.validate_updates(updates)?;
        self.apply_updates(updates, now);
        Ok(())
    }

    async fn commit_pass(
        &self,
        records: &[MatchRecord],
        updates: &DirtySet,
        now: Timestamp,
    ) -> StoreResult<()> {
        let _gate = self.commit_gate.lock();

        if Faults::take(&self.faults.commit) {
            return Err(StoreError::Commit("injected commit failure".to_string()));
        }
        self.validate_updates(updates)?;

        self.matches.lock().extend_from_slice(records);
        self.apply_updates(updates, now);
        self.commits.fetch_add(1, Ordering::AcqRel);

        debug!(
            "committed {} match records and {} order updates",
            records.len(),
            updates.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "InMemoryOrderStore"
    }
}
