use std::collections::BTreeSet;

use crate::ability::AbilityRegistry;
use crate::config::BattleConfig;
use crate::entity::{prune_inactive, Effect, Entity, Projectile, ProjectileSpec, Unit, UnitSpec};
use crate::events::EventBus;
use crate::state::{EntityId, EntityIdAllocator, Point, Team};

/// Entity collections, id allocator and event bus of one simulation.
#[derive(Debug, Default)]
pub struct BattleWorld {
    pub units: Vec<Unit>,
    pub projectiles: Vec<Projectile>,
    pub effects: Vec<Effect>,
    pub ids: EntityIdAllocator,
    pub bus: EventBus,
}

impl BattleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id() == id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id() == id)
    }

    pub fn unit_index(&self, id: EntityId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id() == id)
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| unit.is_active())
    }

    /// Spawns a unit and attaches its resources to the bus.
    pub fn spawn_unit(&mut self, spec: UnitSpec) -> EntityId {
        let id = self.ids.allocate();
        let mut unit = Unit::new(id, spec);
        unit.attach_resources(&self.bus);
        self.units.push(unit);
        id
    }

    pub fn spawn_projectile(&mut self, spec: ProjectileSpec) -> EntityId {
        let id = self.ids.allocate();
        self.projectiles.push(Projectile::new(id, spec));
        id
    }

    pub fn spawn_effect(&mut self, kind: &str, position: Point, duration: f64) -> EntityId {
        let id = self.ids.allocate();
        self.effects.push(Effect::new(id, kind, position, duration));
        id
    }

    /// Units that currently ignore damage.
    pub fn untouchable_units(
        &self,
        registry: &AbilityRegistry,
        config: &BattleConfig,
        tick: u64,
    ) -> BTreeSet<EntityId> {
        self.living_units()
            .filter(|unit| unit.is_untouchable(registry, config, tick))
            .map(Entity::id)
            .collect()
    }

    /// Teams with at least one living unit.
    pub fn teams_alive(&self) -> BTreeSet<Team> {
        self.living_units().map(Unit::team).collect()
    }

    /// Drops deactivated entities. Dropping a unit releases its resource subscriptions.
    pub fn prune(&mut self) {
        let units = prune_inactive(&mut self.units);
        let projectiles = prune_inactive(&mut self.projectiles);
        let effects = prune_inactive(&mut self.effects);
        if units + projectiles + effects > 0 {
            tracing::trace!(units, projectiles, effects, "pruned inactive entities");
        }
    }
}
