//! Error types for order submission and state restoration.

use crate::ability::TargetingError;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{AbilityId, EntityId, PlayerId, Point};

/// Reasons a locally submitted order is rejected before it is applied.
///
/// Replayed orders bypass these checks; the silent-resolve rules for unknown
/// abilities and unaffordable costs apply to them instead.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("engine is not waiting for orders")]
    NotWaiting,

    #[error("waiting for unit {expected}, got an order for {actual}")]
    WrongUnit { expected: EntityId, actual: EntityId },

    #[error("order for tick {actual} while paused at tick {expected}")]
    TickMismatch { expected: u64, actual: u64 },

    #[error("unit {0} not found")]
    UnitNotFound(EntityId),

    #[error("unknown ability `{0}`")]
    UnknownAbility(AbilityId),

    #[error("unit {unit} does not know ability `{ability}`")]
    AbilityNotKnown { unit: EntityId, ability: AbilityId },

    #[error("player {player} has no `{ability}` card in hand")]
    CardNotInHand { player: PlayerId, ability: AbilityId },

    #[error("unit {unit} cannot afford `{ability}`")]
    InsufficientResource { unit: EntityId, ability: AbilityId },

    #[error("move path waypoint {0} is not passable")]
    ImpassableWaypoint(Point),

    #[error("invalid targets: {0}")]
    Targeting(#[from] TargetingError),

    #[error("battle has already finished")]
    BattleFinished,
}

impl GameError for OrderError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotWaiting | Self::WrongUnit { .. } | Self::TickMismatch { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::BattleFinished => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotWaiting => "ORDER_NOT_WAITING",
            Self::WrongUnit { .. } => "ORDER_WRONG_UNIT",
            Self::TickMismatch { .. } => "ORDER_TICK_MISMATCH",
            Self::UnitNotFound(_) => "ORDER_UNIT_NOT_FOUND",
            Self::UnknownAbility(_) => "ORDER_UNKNOWN_ABILITY",
            Self::AbilityNotKnown { .. } => "ORDER_ABILITY_NOT_KNOWN",
            Self::CardNotInHand { .. } => "ORDER_CARD_NOT_IN_HAND",
            Self::InsufficientResource { .. } => "ORDER_INSUFFICIENT_RESOURCE",
            Self::ImpassableWaypoint(_) => "ORDER_IMPASSABLE_WAYPOINT",
            Self::Targeting(_) => "ORDER_TARGETING",
            Self::BattleFinished => "ORDER_BATTLE_FINISHED",
        }
    }
}

/// A serialized state that cannot be loaded into an engine.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RestoreError {
    #[error("state references unknown ability `{0}`")]
    UnknownAbility(AbilityId),

    #[error("entity id {0} appears more than once")]
    DuplicateEntity(EntityId),

    #[error("next entity id {next} does not exceed existing id {existing}")]
    StaleIdCounter { next: u32, existing: EntityId },

    #[error("waiting unit {0} is not in the state")]
    MissingWaitingUnit(EntityId),

    #[error("game tick {tick} does not match game time {time}")]
    ClockMismatch { tick: u64, time: f64 },
}

impl GameError for RestoreError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAbility(_) => "RESTORE_UNKNOWN_ABILITY",
            Self::DuplicateEntity(_) => "RESTORE_DUPLICATE_ENTITY",
            Self::StaleIdCounter { .. } => "RESTORE_STALE_ID_COUNTER",
            Self::MissingWaitingUnit(_) => "RESTORE_MISSING_WAITING_UNIT",
            Self::ClockMismatch { .. } => "RESTORE_CLOCK_MISMATCH",
        }
    }
}
