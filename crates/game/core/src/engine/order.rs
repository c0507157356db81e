use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::ResolvedTarget;
use crate::state::{AbilityId, EntityId, Point, PlayerId, Team};

/// A decision for the unit the engine is waiting on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub unit_id: EntityId,
    /// Registry id, or `"wait"` for a flat cooldown with no effect.
    pub ability_id: AbilityId,
    #[serde(default)]
    pub targets: Vec<ResolvedTarget>,
    /// `Some(empty)` clears the current path; `None` leaves it untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_path: Option<Vec<Point>>,
}

impl Order {
    pub fn wait(unit_id: EntityId) -> Self {
        Self {
            unit_id,
            ability_id: AbilityId::wait(),
            targets: Vec::new(),
            move_path: None,
        }
    }

    pub fn ability(
        unit_id: EntityId,
        ability_id: impl Into<AbilityId>,
        targets: Vec<ResolvedTarget>,
    ) -> Self {
        Self {
            unit_id,
            ability_id: ability_id.into(),
            targets,
            move_path: None,
        }
    }

    pub fn with_move_path(mut self, path: Vec<Point>) -> Self {
        self.move_path = Some(path);
        self
    }

    pub fn is_wait(&self) -> bool {
        self.ability_id.is_wait()
    }
}

/// Position of an order in the log: the tick it took effect at, then the
/// order of application within that tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub tick: u64,
    pub seq: u32,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tick, self.seq)
    }
}

/// An order stamped with the tick it was applied at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedOrder {
    pub tick: u64,
    pub seq: u32,
    pub order: Order,
}

impl TimedOrder {
    pub fn key(&self) -> OrderKey {
        OrderKey {
            tick: self.tick,
            seq: self.seq,
        }
    }
}

/// The controllable unit the simulation is paused on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingForOrders {
    pub unit_id: EntityId,
    pub owner_id: PlayerId,
}

/// Terminal result of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOutcome {
    /// `None` when every unit died on the same tick.
    pub winner: Option<Team>,
    pub tick: u64,
}
