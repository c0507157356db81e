//! In-memory store shared by every session of one process.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use battle_core::{OrderKey, TimedOrder};

use super::{BattleTransport, OrderBatch, StoredSnapshot, TransportResult};
use crate::error::TransportError;

#[derive(Debug, Default)]
struct Store {
    snapshots: BTreeMap<u64, StoredSnapshot>,
    orders: BTreeMap<u64, BTreeMap<OrderKey, TimedOrder>>,
}

impl Store {
    fn merge(&mut self, checkpoint: u64, order: TimedOrder) {
        self.orders
            .entry(checkpoint)
            .or_default()
            .insert(order.key(), order);
    }

    fn head_tick(&self) -> u64 {
        let snapshot = self.snapshots.keys().next_back().copied().unwrap_or(0);
        let order = self
            .orders
            .values()
            .filter_map(|bucket| bucket.keys().next_back())
            .map(|key| key.tick)
            .max()
            .unwrap_or(0);
        snapshot.max(order)
    }
}

/// Thread-safe store for tests and single-process demos.
///
/// Needs the battle's checkpoint interval to bucket orders carried by
/// snapshots. [`set_offline`](Self::set_offline) makes every call fail, to
/// exercise the session's network-failure paths.
#[derive(Debug)]
pub struct InMemoryTransport {
    checkpoint_interval: u64,
    store: RwLock<Store>,
    offline: AtomicBool,
}

impl InMemoryTransport {
    pub fn new(checkpoint_interval: u64) -> Self {
        Self {
            checkpoint_interval: checkpoint_interval.max(1),
            store: RwLock::new(Store::default()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Ticks of every stored snapshot, ascending.
    pub fn snapshot_ticks(&self) -> TransportResult<Vec<u64>> {
        let store = self.store.read().map_err(|_| TransportError::LockPoisoned)?;
        Ok(store.snapshots.keys().copied().collect())
    }

    /// Number of orders stored across all buckets.
    pub fn order_count(&self) -> TransportResult<usize> {
        let store = self.store.read().map_err(|_| TransportError::LockPoisoned)?;
        Ok(store.orders.values().map(BTreeMap::len).sum())
    }

    fn checkpoint_for(&self, tick: u64) -> u64 {
        tick - tick % self.checkpoint_interval
    }

    fn ensure_online(&self) -> TransportResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("in-memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BattleTransport for InMemoryTransport {
    async fn save_snapshot(
        &self,
        snapshot: StoredSnapshot,
        orders: Vec<TimedOrder>,
    ) -> TransportResult<()> {
        self.ensure_online()?;
        let mut store = self.store.write().map_err(|_| TransportError::LockPoisoned)?;

        for order in orders {
            let checkpoint = self.checkpoint_for(order.tick);
            store.merge(checkpoint, order);
        }
        tracing::trace!(tick = snapshot.tick, hash = %snapshot.hash, "snapshot stored");
        store.snapshots.insert(snapshot.tick, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, tick: Option<u64>) -> TransportResult<Option<StoredSnapshot>> {
        self.ensure_online()?;
        let store = self.store.read().map_err(|_| TransportError::LockPoisoned)?;

        let snapshot = match tick {
            Some(tick) => store.snapshots.get(&tick),
            None => store.snapshots.values().next_back(),
        };
        Ok(snapshot.cloned())
    }

    async fn save_order(&self, checkpoint_tick: u64, order: TimedOrder) -> TransportResult<()> {
        self.ensure_online()?;
        let mut store = self.store.write().map_err(|_| TransportError::LockPoisoned)?;

        tracing::trace!(checkpoint = checkpoint_tick, key = %order.key(), "order stored");
        store.merge(checkpoint_tick, order);
        Ok(())
    }

    async fn get_orders(&self, checkpoint_tick: u64) -> TransportResult<OrderBatch> {
        self.ensure_online()?;
        let store = self.store.read().map_err(|_| TransportError::LockPoisoned)?;

        Ok(OrderBatch {
            orders: store
                .orders
                .get(&checkpoint_tick)
                .map(|bucket| bucket.values().cloned().collect())
                .unwrap_or_default(),
            state: store.snapshots.get(&checkpoint_tick).cloned(),
            tick: store.head_tick(),
        })
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{EntityId, Order};
    use battle_content::{BattleContent, CharacterSelection, ContentFactory};

    use super::*;
    use crate::transport::stored_snapshot;

    fn order(tick: u64, seq: u32) -> TimedOrder {
        TimedOrder {
            tick,
            seq,
            order: Order::wait(EntityId(1)),
        }
    }

    fn snapshot() -> StoredSnapshot {
        let engine = BattleContent::load(&ContentFactory::bundled(), "training_grounds")
            .and_then(|content| content.new_battle(&[CharacterSelection::new("alice", "knight")], 3))
            .expect("bundled battle");
        stored_snapshot(&engine.serialize()).expect("snapshot encodes")
    }

    #[tokio::test]
    async fn snapshot_orders_merge_with_saved_orders() {
        let transport = InMemoryTransport::new(300);
        transport.save_order(0, order(120, 0)).await.unwrap();
        transport.save_order(0, order(180, 0)).await.unwrap();

        let mut at_300 = snapshot();
        at_300.tick = 300;
        transport
            .save_snapshot(at_300, vec![order(120, 0), order(240, 0)])
            .await
            .unwrap();

        let batch = transport.get_orders(0).await.unwrap();
        let ticks: Vec<u64> = batch.orders.iter().map(|order| order.tick).collect();
        assert_eq!(ticks, vec![120, 180, 240]);
        assert!(batch.state.is_none());
        assert_eq!(batch.tick, 300);
    }

    #[tokio::test]
    async fn latest_snapshot_is_returned_without_a_tick() {
        let transport = InMemoryTransport::new(300);
        assert!(transport.get_snapshot(None).await.unwrap().is_none());

        for tick in [0, 300, 600] {
            let mut stored = snapshot();
            stored.tick = tick;
            transport.save_snapshot(stored, Vec::new()).await.unwrap();
        }

        let latest = transport.get_snapshot(None).await.unwrap().unwrap();
        assert_eq!(latest.tick, 600);
        let earlier = transport.get_snapshot(Some(300)).await.unwrap().unwrap();
        assert_eq!(earlier.tick, 300);
        assert_eq!(transport.get_orders(300).await.unwrap().state, Some(earlier));
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let transport = InMemoryTransport::new(300);
        transport.set_offline(true);
        assert!(matches!(
            transport.get_orders(0).await,
            Err(TransportError::Unavailable(_))
        ));
        assert!(transport.save_order(0, order(1, 0)).await.is_err());

        transport.set_offline(false);
        transport.save_order(0, order(1, 0)).await.unwrap();
        assert_eq!(transport.order_count().unwrap(), 1);
    }
}
