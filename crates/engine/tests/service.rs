//! End-to-end: in-memory store, fixed clock, both dispatch modes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matchbook_clock::{Clock, FixedClock};
use matchbook_core::{DirtySet, MatchRecord, Order, Position, SecurityId, Timestamp};
use matchbook_engine::{DispatchConfig, EngineConfig, MatchService};
use matchbook_store::{InMemoryOrderStore, OrderStore, StoreResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Commits take longer than the poll interval, so ticks read uncommitted books
struct SlowCommitStore {
    inner: InMemoryOrderStore,
    delay: Duration,
}

#[async_trait]
impl OrderStore for SlowCommitStore {
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
        tokio::time::sleep(self.delay).await;
        self.inner.commit_pass(records, updates, now).await
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(seconds)
}

fn order(
    id: u64,
    security_id: SecurityId,
    position: Position,
    price: i64,
    qty: u64,
    t: i64,
) -> Order {
    Order::new_with_time(id, security_id, position, Decimal::from(price), qty, at(t))
}

fn configs() -> Vec<EngineConfig> {
    vec![
        EngineConfig::default().with_dispatch(DispatchConfig::locking(4)),
        EngineConfig::default().with_dispatch(DispatchConfig::partitioned(4, 64)),
    ]
}

fn service(
    config: EngineConfig,
    store: &InMemoryOrderStore,
    clock: &Arc<FixedClock>,
) -> MatchService {
    MatchService::new(config, Arc::new(store.clone()), clock.clone()).unwrap()
}

/// One poll cycle with every dispatched pass finished
async fn settle(service: &MatchService) {
    let before = service.stats();
    let report = service.poll_once().await;
    for _ in 0..400 {
        let stats = service.stats();
        let finished = stats.passes_completed + stats.passes_failed + stats.passes_panicked;
        let finished_before =
            before.passes_completed + before.passes_failed + before.passes_panicked;
        if finished - finished_before >= report.dispatched as u64 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("passes did not finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_documented_scenarios() {
    init_logger();

    for config in configs() {
        let store = InMemoryOrderStore::new();
        // Partial fill at the ask
        store.submit(order(1, 1, Position::Long, 100, 5, 0));
        store.submit(order(2, 1, Position::Short, 95, 3, 0));
        // No cross
        store.submit(order(3, 2, Position::Long, 90, 5, 0));
        store.submit(order(4, 2, Position::Short, 95, 5, 0));
        // Time priority at one price
        store.submit(order(5, 3, Position::Long, 100, 3, 0));
        store.submit(order(6, 3, Position::Long, 100, 3, 1));
        store.submit(order(7, 3, Position::Short, 100, 4, 0));
        // Exhausted ask is skipped
        store.submit(order(8, 4, Position::Long, 100, 5, 0));
        store.submit(order(9, 4, Position::Short, 90, 4, 0).with_unmatched(0));
        store.submit(order(10, 4, Position::Short, 95, 5, 0));

        let clock = Arc::new(FixedClock::new(at(1_000)));
        let service = service(config, &store, &clock);
        service.start().await.unwrap();
        settle(&service).await;
        service.shutdown().await.unwrap();

        let trades = |security_id| -> Vec<(u64, u64, Decimal, u64)> {
            store
                .matches()
                .into_iter()
                .filter(|m| m.security_id == security_id)
                .map(|m| (m.long_order_id, m.short_order_id, m.price, m.quantity))
                .collect()
        };

        assert_eq!(trades(1), vec![(1, 2, dec!(95), 3)]);
        assert_eq!(store.order(1).unwrap().unmatched, 2);
        assert_eq!(store.order(2).unwrap().unmatched, 0);

        assert!(trades(2).is_empty());
        assert_eq!(store.order(3).unwrap().revision, 0);

        assert_eq!(trades(3), vec![(5, 7, dec!(100), 3), (6, 7, dec!(100), 1)]);
        assert_eq!(store.order(6).unwrap().unmatched, 2);

        assert_eq!(trades(4), vec![(8, 10, dec!(95), 5)]);
        assert_eq!(store.order(9).unwrap().revision, 0);

        let stamped = store.matches().iter().all(|m| m.create_time == clock.now());
        assert!(stamped);
        assert_eq!(store.order(1).unwrap().update_time, clock.now());
        assert_eq!(store.order(1).unwrap().revision, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repoll_adds_no_trades() {
    init_logger();

    for config in configs() {
        let store = InMemoryOrderStore::new();
        for i in 0..10u64 {
            let position = if i % 2 == 0 { Position::Long } else { Position::Short };
            let price = 100 + (i as i64 % 3) - 1;
            store.submit(order(i + 1, 5, position, price, 2 + i % 4, i as i64));
        }

        let clock = Arc::new(FixedClock::new(at(0)));
        let service = service(config, &store, &clock);
        service.start().await.unwrap();

        settle(&service).await;
        let first = store.matches().len();
        assert!(first > 0);

        clock.advance(chrono::Duration::seconds(1));
        settle(&service).await;
        settle(&service).await;
        service.shutdown().await.unwrap();

        assert_eq!(store.matches().len(), first);
        for order in store.orders_for(5) {
            assert!(order.unmatched <= order.quantity);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_commits_never_overfill_an_order() {
    init_logger();

    for config in configs() {
        let inner = InMemoryOrderStore::new();
        inner.submit(order(1, 1, Position::Long, 100, 5, 0));
        inner.submit(order(2, 1, Position::Short, 95, 3, 0));
        let store = Arc::new(SlowCommitStore {
            inner: inner.clone(),
            delay: Duration::from_millis(60),
        });

        let config = config.with_poll_interval(Duration::from_millis(10));
        let service =
            MatchService::new(config, store, Arc::new(FixedClock::at_epoch())).unwrap();
        service.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        service.shutdown().await.unwrap();

        let mut traded: HashMap<u64, u64> = HashMap::new();
        for record in inner.matches() {
            *traded.entry(record.long_order_id).or_default() += record.quantity;
            *traded.entry(record.short_order_id).or_default() += record.quantity;
        }
        assert_eq!(traded.get(&2), Some(&3));
        assert_eq!(traded.get(&1), Some(&3));
        assert_eq!(inner.matches().len(), 1);
        assert_eq!(inner.order(1).unwrap().unmatched, 2);
        assert_eq!(inner.order(2).unwrap().unmatched, 0);

        let stats = service.stats();
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.passes_failed, stats.passes_stale);
        assert!(stats.passes_stale >= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_commit_heals_on_next_poll() {
    init_logger();

    for config in configs() {
        let store = InMemoryOrderStore::new();
        store.submit(order(1, 1, Position::Long, 100, 5, 0));
        store.submit(order(2, 1, Position::Short, 95, 3, 0));

        let clock = Arc::new(FixedClock::at_epoch());
        let service = service(config, &store, &clock);
        service.start().await.unwrap();

        store.fail_next_commit();
        settle(&service).await;
        assert_eq!(service.stats().passes_failed, 1);
        assert!(store.matches().is_empty());
        assert_eq!(store.order(1).unwrap().unmatched, 5);

        settle(&service).await;
        service.shutdown().await.unwrap();

        assert_eq!(store.matches().len(), 1);
        assert_eq!(store.order(1).unwrap().unmatched, 2);
        assert_eq!(store.order(2).unwrap().unmatched, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_listing_failure_is_retried() {
    init_logger();
    let store = InMemoryOrderStore::new();
    store.submit(order(1, 1, Position::Long, 100, 5, 0));
    store.submit(order(2, 1, Position::Short, 95, 5, 0));

    let clock = Arc::new(FixedClock::at_epoch());
    let service = service(EngineConfig::default(), &store, &clock);
    service.start().await.unwrap();

    store.fail_next_fetch();
    let report = service.poll_once().await;
    assert!(report.listing_failed);

    settle(&service).await;
    service.shutdown().await.unwrap();
    assert_eq!(store.matches().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_background_loop_matches_and_stops() {
    init_logger();
    let store = InMemoryOrderStore::new();
    store.submit(order(1, 1, Position::Long, 100, 5, 0));
    store.submit(order(2, 1, Position::Short, 95, 5, 0));

    let config = EngineConfig::default().with_poll_interval(Duration::from_millis(10));
    let clock = Arc::new(FixedClock::at_epoch());
    let service = service(config, &store, &clock);

    service.start().await.unwrap();
    assert!(service.is_polling());

    let mut matched = false;
    for _ in 0..200 {
        if !store.matches().is_empty() {
            matched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(matched);

    service.shutdown().await.unwrap();
    assert!(!service.is_polling());

    // Nothing polls after shutdown
    store.submit(order(3, 2, Position::Long, 100, 1, 0));
    store.submit(order(4, 2, Position::Short, 100, 1, 0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.matches().len(), 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = EngineConfig::default().with_dispatch(DispatchConfig::partitioned(8, 4));
    let result = MatchService::new(
        config,
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(FixedClock::at_epoch()),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_match_description_from_config() {
    let store = InMemoryOrderStore::new();
    store.submit(order(1, 1, Position::Long, 100, 1, 0));
    store.submit(order(2, 1, Position::Short, 100, 1, 0));

    let config = EngineConfig::from_json(r#"{"match_description": "auction close"}"#).unwrap();
    let clock = Arc::new(FixedClock::at_epoch());
    let service = service(config, &store, &clock);
    service.start().await.unwrap();
    settle(&service).await;
    service.shutdown().await.unwrap();

    assert_eq!(store.matches()[0].description, "auction close");
}
