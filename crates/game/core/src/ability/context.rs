use super::{AbilityRegistry, ResolvedTarget};
use crate::config::BattleConfig;
use crate::entity::{Entity, ProjectileSpec, Unit};
use crate::state::{EntityId, Point, Team};
use crate::terrain::TerrainGrid;
use crate::world::BattleWorld;

/// Mutable view of the battle handed to [`Ability::apply`](super::Ability::apply).
pub struct EffectContext<'a> {
    world: &'a mut BattleWorld,
    registry: &'a AbilityRegistry,
    grid: &'a TerrainGrid,
    config: &'a BattleConfig,
    tick: u64,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        world: &'a mut BattleWorld,
        registry: &'a AbilityRegistry,
        grid: &'a TerrainGrid,
        config: &'a BattleConfig,
        tick: u64,
    ) -> Self {
        Self {
            world,
            registry,
            grid,
            config,
            tick,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f64 {
        self.config.time_at(self.tick)
    }

    pub fn grid(&self) -> &TerrainGrid {
        self.grid
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.world.unit(id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.world.unit_mut(id)
    }

    /// Living units not on `team`, in iteration order.
    pub fn enemies_of(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.world
            .units
            .iter()
            .filter(move |unit| unit.is_active() && unit.team() != team)
    }

    pub fn is_untouchable(&self, id: EntityId) -> bool {
        self.world
            .unit(id)
            .is_some_and(|unit| unit.is_untouchable(self.registry, self.config, self.tick))
    }

    /// Damages `target` unless it is untouchable. Returns the hp removed.
    pub fn deal_damage(&mut self, target: EntityId, amount: f64, source: Option<EntityId>) -> f64 {
        if self.is_untouchable(target) {
            tracing::trace!(%target, "damage ignored: untouchable");
            return 0.0;
        }
        let bus = self.world.bus.clone();
        self.world
            .unit_mut(target)
            .map_or(0.0, |unit| unit.take_damage(amount, source, &bus))
    }

    pub fn heal(&mut self, target: EntityId, amount: f64) -> f64 {
        self.world
            .unit_mut(target)
            .map_or(0.0, |unit| unit.heal(amount))
    }

    pub fn spawn_projectile(&mut self, spec: ProjectileSpec) -> EntityId {
        self.world.spawn_projectile(spec)
    }

    pub fn spawn_effect(&mut self, kind: &str, position: Point, duration: f64) -> EntityId {
        self.world.spawn_effect(kind, position, duration)
    }

    /// World position a target refers to. `None` if the unit is gone.
    pub fn target_point(&self, target: &ResolvedTarget) -> Option<Point> {
        match *target {
            ResolvedTarget::Pixel { x, y } => Some(Point::new(x, y)),
            ResolvedTarget::Player { unit } | ResolvedTarget::Unit { unit } => self
                .world
                .unit(unit)
                .filter(|unit| unit.is_active())
                .map(Entity::position),
        }
    }
}
