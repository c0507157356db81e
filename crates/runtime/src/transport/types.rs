use battle_core::{SerializedGameState, TimedOrder};
use serde::{Deserialize, Serialize};

/// A checkpoint as persisted by the authority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub tick: u64,
    /// SHA-256 hex digest of the canonical state encoding.
    pub hash: String,
    pub state: SerializedGameState,
}

/// Response to an order-log fetch for one checkpoint bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBatch {
    /// Orders stored under the bucket, sorted by `(tick, seq)`.
    pub orders: Vec<TimedOrder>,
    /// Snapshot taken at the bucket's checkpoint tick, if one was saved.
    pub state: Option<StoredSnapshot>,
    /// Highest tick the store knows of, from any snapshot or order.
    pub tick: u64,
}
