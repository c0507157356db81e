//! Simulated objects: acting units, ballistic projectiles and timed effects.
//!
//! Every kind implements [`Entity`]. A deactivated entity stays in its owning
//! collection until [`prune_inactive`] runs at the end of the tick, so
//! iteration order during a tick is stable.

mod effect;
mod projectile;
mod resource;
mod unit;

pub use effect::{Effect, EffectSnapshot};
pub use projectile::{Impact, Projectile, ProjectileContext, ProjectileSnapshot, ProjectileSpec};
pub use resource::{Resource, ResourceKind, ResourceSnapshot, ResourceSpec};
pub use unit::{ActiveAbility, Movement, Unit, UnitContext, UnitSnapshot, UnitSpec};

use crate::state::{EntityId, Point};

/// Contract shared by all simulated objects.
pub trait Entity {
    /// Borrowed view of the world the entity needs during its update.
    type Context<'a>;

    /// Serialized form stored in checkpoints.
    type Snapshot;

    fn id(&self) -> EntityId;

    fn position(&self) -> Point;

    fn is_active(&self) -> bool;

    /// Advances the entity by one fixed step of `dt` seconds.
    fn update(&mut self, dt: f64, ctx: Self::Context<'_>);

    fn serialize(&self) -> Self::Snapshot;
}

/// Removes deactivated entities, preserving the order of the rest.
/// Returns how many were removed.
pub fn prune_inactive<E: Entity>(entities: &mut Vec<E>) -> usize {
    let before = entities.len();
    entities.retain(Entity::is_active);
    before - entities.len()
}
