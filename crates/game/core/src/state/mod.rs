//! Identifiers, geometry, and the serialized battle state.
//!
//! [`SerializedGameState`] is the checkpoint/reconnect format. It holds every
//! field the step function reads, so serialize → deserialize → restore yields
//! an engine that continues identically.

mod common;

pub use common::{AbilityId, EntityId, EntityIdAllocator, PlayerId, Point, Team};

use serde::{Deserialize, Serialize};

use crate::cards::CardPiles;
use crate::engine::{BattleOutcome, TimedOrder, WaitingForOrders};
use crate::entity::{EffectSnapshot, ProjectileSnapshot, UnitSnapshot};

/// Full engine state as exchanged between clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedGameState {
    /// Simulated seconds; always `game_tick / tick_rate`.
    pub game_time: f64,
    pub game_tick: u64,
    pub round_number: u32,
    /// Checkpoints emitted so far.
    pub snapshot_index: u64,
    pub seed: u64,
    pub next_entity_id: u32,
    pub units: Vec<UnitSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub effects: Vec<EffectSnapshot>,
    pub cards: CardPiles,
    pub waiting_for_orders: Option<WaitingForOrders>,
    /// Replayed orders received but not yet applied.
    pub pending_orders: Vec<TimedOrder>,
    pub last_order: Option<TimedOrder>,
    pub orders_since_checkpoint: Vec<TimedOrder>,
    pub outcome: Option<BattleOutcome>,
}

impl SerializedGameState {
    pub fn unit(&self, id: EntityId) -> Option<&UnitSnapshot> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
