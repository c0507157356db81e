use serde::{Deserialize, Serialize};

use crate::entity::ResourceKind;
use crate::state::{AbilityId, EntityId, Point};

/// Shape of one target an ability asks for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A player-controlled unit.
    Player,
    /// Any living unit.
    Unit,
    /// A bare world position.
    Pixel,
}

/// A target chosen for an order. The payload always matches the discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedTarget {
    Player { unit: EntityId },
    Unit { unit: EntityId },
    Pixel { x: f64, y: f64 },
}

impl ResolvedTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            ResolvedTarget::Player { .. } => TargetKind::Player,
            ResolvedTarget::Unit { .. } => TargetKind::Unit,
            ResolvedTarget::Pixel { .. } => TargetKind::Pixel,
        }
    }

    pub fn unit(&self) -> Option<EntityId> {
        match *self {
            ResolvedTarget::Player { unit } | ResolvedTarget::Unit { unit } => Some(unit),
            ResolvedTarget::Pixel { .. } => None,
        }
    }

    pub fn pixel(point: Point) -> Self {
        ResolvedTarget::Pixel {
            x: point.x,
            y: point.y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub kind: ResourceKind,
    pub amount: f64,
}

/// Minimum and maximum preferred distance to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiRange {
    pub min: f64,
    pub max: f64,
}

impl AiRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }

    /// Preferred stand-off distance.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl Default for AiRange {
    fn default() -> Self {
        Self::new(0.0, 48.0)
    }
}

/// Static data describing an ability. Immutable after load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDescriptor {
    pub id: AbilityId,
    pub name: String,
    /// Cooldown applied to the caster on use, in seconds.
    pub cooldown: f64,
    #[serde(default)]
    pub cost: Option<ResourceCost>,
    /// Round boundaries a used card spends in exile.
    #[serde(default)]
    pub recharge_turns: u32,
    /// Ordered target requirements.
    #[serde(default)]
    pub targets: Vec<TargetKind>,
    /// Seconds after activation at which the main effect fires.
    #[serde(default)]
    pub prefire_time: f64,
    #[serde(default)]
    pub ai_range: AiRange,
}

/// Lingering state an active ability imposes on its caster.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityState {
    /// Incoming damage and projectiles are ignored.
    Untouchable,
    /// Speed multiplier in `[0, 1]`.
    MovementPenalty(f64),
}
