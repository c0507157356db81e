use serde::{Deserialize, Serialize};

use crate::state::{AbilityId, EntityId};

/// Topics for event routing. Subscribers register for exactly one topic.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Topic {
    Damage,
    Death,
    Turn,
    Ability,
    Round,
}

/// Notifications raised synchronously while a tick is being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A unit lost hit points. `amount` is the hp actually removed.
    DamageTaken {
        unit: EntityId,
        amount: f64,
        source: Option<EntityId>,
    },
    /// A unit's hp reached zero. Raised exactly once per unit.
    UnitDied {
        unit: EntityId,
        source: Option<EntityId>,
    },
    /// A unit resolved its turn (ability, wait or no-op).
    TurnEnded { unit: EntityId },
    AbilityUsed { unit: EntityId, ability: AbilityId },
    RoundEnded { round: u32 },
}

impl BattleEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BattleEvent::DamageTaken { .. } => Topic::Damage,
            BattleEvent::UnitDied { .. } => Topic::Death,
            BattleEvent::TurnEnded { .. } => Topic::Turn,
            BattleEvent::AbilityUsed { .. } => Topic::Ability,
            BattleEvent::RoundEnded { .. } => Topic::Round,
        }
    }
}
