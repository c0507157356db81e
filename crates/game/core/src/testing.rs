//! Fixtures shared by unit tests across modules.

use std::sync::Arc;

use crate::ability::{
    crossed, Ability, AbilityDescriptor, AbilityRegistry, AiRange, EffectContext, ResolvedTarget,
    ResourceCost, TargetKind,
};
use crate::config::BattleConfig;
use crate::engine::BattleEngine;
use crate::entity::{Unit, UnitSpec};
use crate::state::{AbilityId, EntityId, PlayerId, Point, Team};
use crate::terrain::{TerrainGrid, TerrainKind};

/// Single-target melee hit that lands 0.1 s after activation.
#[derive(Debug)]
pub struct Strike {
    descriptor: AbilityDescriptor,
    damage: f64,
}

impl Strike {
    pub fn new(id: &str, damage: f64) -> Self {
        Self {
            descriptor: AbilityDescriptor {
                id: AbilityId::new(id),
                name: id.to_owned(),
                cooldown: 1.0,
                cost: None,
                recharge_turns: 1,
                targets: vec![TargetKind::Unit],
                prefire_time: 0.1,
                ai_range: AiRange::new(0.0, 60.0),
            },
            damage,
        }
    }

    pub fn with_cost(mut self, cost: ResourceCost) -> Self {
        self.descriptor.cost = Some(cost);
        self
    }

    pub fn with_ai_range(mut self, min: f64, max: f64) -> Self {
        self.descriptor.ai_range = AiRange::new(min, max);
        self
    }

    pub fn with_targets(mut self, targets: Vec<TargetKind>) -> Self {
        self.descriptor.targets = targets;
        self
    }
}

impl Ability for Strike {
    fn descriptor(&self) -> &AbilityDescriptor {
        &self.descriptor
    }

    fn description(&self, _caster: Option<&Unit>) -> String {
        format!("Deals {} damage.", self.damage)
    }

    fn apply(
        &self,
        ctx: &mut EffectContext<'_>,
        caster: EntityId,
        targets: &[ResolvedTarget],
        prev_time: f64,
        current_time: f64,
    ) {
        if !crossed(prev_time, current_time, self.descriptor.prefire_time) {
            return;
        }
        if let Some(target) = targets.first().and_then(ResolvedTarget::unit) {
            ctx.deal_damage(target, self.damage, Some(caster));
        }
    }
}

pub fn spec(team: Team, owner: Option<&str>, position: Point) -> UnitSpec {
    UnitSpec {
        template: if owner.is_some() { "knight" } else { "goblin" }.into(),
        position,
        radius: 14.0,
        max_hp: 40.0,
        speed: 80.0,
        team,
        owner: owner.map(PlayerId::new),
        abilities: vec![AbilityId::new("strike")],
        resources: Vec::new(),
        ai_range: AiRange::new(0.0, 48.0),
        initial_cooldown: 0.0,
    }
}

/// A detached unit with radius 14, for geometry checks.
pub fn unit_at(id: u32, team: Team, controllable: bool, position: Point) -> Unit {
    let owner = controllable.then_some("alice");
    Unit::new(EntityId(id), spec(team, owner, position))
}

pub fn registry() -> Arc<AbilityRegistry> {
    let registry = AbilityRegistry::builder()
        .register(Strike::new("strike", 10.0))
        .expect("strike registers")
        .build();
    Arc::new(registry)
}

pub fn open_grid() -> Arc<TerrainGrid> {
    Arc::new(TerrainGrid::new(20, 12, 32.0, TerrainKind::Road))
}

/// One player knight facing one goblin, 300 px apart.
pub fn duel(seed: u64) -> BattleEngine {
    let mut engine = BattleEngine::new(BattleConfig::default(), registry(), open_grid(), seed);
    engine.spawn_unit(UnitSpec {
        initial_cooldown: 2.0,
        ..spec(Team::PLAYERS, Some("alice"), Point::new(100.0, 200.0))
    });
    engine.spawn_unit(UnitSpec {
        initial_cooldown: 0.5,
        ..spec(Team::ENEMIES, None, Point::new(400.0, 200.0))
    });
    engine
}
