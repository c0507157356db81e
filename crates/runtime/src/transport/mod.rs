//! Contract for the shared snapshot and order store.
//!
//! Any RPC shape works as long as it offers these four operations. Orders are
//! bucketed by the checkpoint whose interval contains their tick and are
//! merged by `(tick, seq)`, so saving the same order twice is harmless.

mod memory;
mod types;

use async_trait::async_trait;
use battle_core::{SerializedGameState, TimedOrder};

pub use memory::InMemoryTransport;
pub use types::{OrderBatch, StoredSnapshot};

use crate::error::TransportError;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[async_trait]
pub trait BattleTransport: Send + Sync {
    /// Stores the snapshot taken at `snapshot.tick` and merges `orders` into
    /// their checkpoint buckets.
    async fn save_snapshot(
        &self,
        snapshot: StoredSnapshot,
        orders: Vec<TimedOrder>,
    ) -> TransportResult<()>;

    /// Snapshot at `tick`, or the latest one when `tick` is `None`.
    async fn get_snapshot(&self, tick: Option<u64>) -> TransportResult<Option<StoredSnapshot>>;

    /// Appends one order to the bucket for `checkpoint_tick`.
    async fn save_order(
        &self,
        checkpoint_tick: u64,
        order: TimedOrder,
    ) -> TransportResult<()>;

    async fn get_orders(&self, checkpoint_tick: u64) -> TransportResult<OrderBatch>;
}

/// Convenience for building a snapshot record with its digest.
pub fn stored_snapshot(state: &SerializedGameState) -> TransportResult<StoredSnapshot> {
    Ok(StoredSnapshot {
        tick: state.game_tick,
        hash: crate::sync::state_hash(state)?,
        state: state.clone(),
    })
}
