//! Deterministic battle simulation shared by every client of a battle.
//!
//! `battle-core` owns the rules: entities and their resources, the event bus,
//! abilities and targeting, terrain and path planning, rounds and cards, and
//! the fixed-step [`BattleEngine`] with its turn-pause scheduler. It performs
//! no I/O; transport, clocks and content loading live in sibling crates.
//!
//! Everything that affects the simulation is a pure function of the battle
//! seed, the tick count and the order log, so two engines fed the same orders
//! produce byte-identical [`SerializedGameState`]s at every checkpoint.
pub mod ability;
pub mod cards;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod events;
pub mod rng;
pub mod state;
pub mod terrain;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use ability::{
    crossed, Ability, AbilityDescriptor, AbilityRegistry, AbilityRegistryBuilder, AbilityState,
    AiRange, ClickCandidate, EffectContext, RegistryError, ResolvedTarget, ResourceCost,
    SelectionProgress, TargetKind, TargetResolver, TargetSelection, TargetingError,
};
pub use cards::{CardDefinition, CardInstance, CardLocation, CardPiles};
pub use config::BattleConfig;
pub use engine::{
    BattleEngine, BattleOutcome, CheckpointOutput, EngineOutput, Order, OrderError, OrderKey,
    RestoreError, TimedOrder, WaitingForOrders,
};
pub use entity::{
    Effect, Entity, Projectile, ProjectileSpec, Resource, ResourceKind, ResourceSpec, Unit,
    UnitSnapshot, UnitSpec,
};
pub use error::{ErrorSeverity, GameError};
pub use events::{BattleEvent, EventBus, Subscription, Topic};
pub use rng::{compute_seed, PcgRng, RngOracle};
pub use state::{AbilityId, EntityId, PlayerId, Point, SerializedGameState, Team};
pub use terrain::{Cell, GridError, Pathfinder, TerrainGrid, TerrainKind};
pub use world::BattleWorld;
