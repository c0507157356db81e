use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceKind, ResourceSnapshot, ResourceSpec};
use super::Entity;
use crate::ability::{AbilityRegistry, AbilityState, AiRange, ResolvedTarget, ResourceCost};
use crate::config::BattleConfig;
use crate::events::{BattleEvent, EventBus};
use crate::state::{AbilityId, EntityId, PlayerId, Point, Team};
use crate::terrain::TerrainGrid;

/// Remaining cooldown below this is treated as elapsed.
const COOLDOWN_EPSILON: f64 = 1e-9;

/// Spawn parameters for a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSpec {
    pub template: String,
    pub position: Point,
    pub radius: f64,
    pub max_hp: f64,
    pub speed: f64,
    pub team: Team,
    /// `Some` for player-controlled units.
    pub owner: Option<PlayerId>,
    pub abilities: Vec<AbilityId>,
    pub resources: Vec<ResourceSpec>,
    pub ai_range: AiRange,
    pub initial_cooldown: f64,
}

/// Waypoints the unit is currently walking, nearest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub path: VecDeque<Point>,
    /// Enemy the path was planned against, used by the AI to reuse paths.
    pub tracked_target: Option<EntityId>,
    pub started_tick: u64,
}

/// An ability executing its time-phased effect on a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAbility {
    pub ability: AbilityId,
    pub activated_tick: u64,
    pub targets: Vec<ResolvedTarget>,
}

impl ActiveAbility {
    /// Seconds since activation at the end of `tick`.
    pub fn elapsed(&self, tick: u64, config: &BattleConfig) -> f64 {
        config.time_at(tick.saturating_sub(self.activated_tick))
    }
}

/// Read-only world view for [`Unit::update`].
#[derive(Clone, Copy)]
pub struct UnitContext<'a> {
    pub grid: &'a TerrainGrid,
    pub registry: &'a AbilityRegistry,
    pub config: &'a BattleConfig,
    pub tick: u64,
}

/// Acting combatant.
#[derive(Debug)]
pub struct Unit {
    id: EntityId,
    template: String,
    position: Point,
    radius: f64,
    hp: f64,
    max_hp: f64,
    speed: f64,
    team: Team,
    owner: Option<PlayerId>,
    cooldown_remaining: f64,
    cooldown_total: f64,
    movement: Option<Movement>,
    abilities: Vec<AbilityId>,
    active_abilities: Vec<ActiveAbility>,
    resources: Vec<Resource>,
    ai_range: AiRange,
    active: bool,
}

impl Unit {
    /// Creates a unit. Resources are not listening until [`attach_resources`](Self::attach_resources).
    pub fn new(id: EntityId, spec: UnitSpec) -> Self {
        let max_hp = spec.max_hp.max(0.0);
        let initial_cooldown = spec.initial_cooldown.max(0.0);
        Self {
            id,
            template: spec.template,
            position: spec.position,
            radius: spec.radius,
            hp: max_hp,
            max_hp,
            speed: spec.speed,
            team: spec.team,
            owner: spec.owner,
            cooldown_remaining: initial_cooldown,
            cooldown_total: initial_cooldown,
            movement: None,
            abilities: spec.abilities,
            active_abilities: Vec::new(),
            resources: spec.resources.into_iter().map(Resource::new).collect(),
            ai_range: spec.ai_range,
            active: max_hp > 0.0,
        }
    }

    pub fn from_snapshot(snapshot: &UnitSnapshot) -> Self {
        Self {
            id: snapshot.id,
            template: snapshot.template.clone(),
            position: Point::new(snapshot.x, snapshot.y),
            radius: snapshot.radius,
            hp: snapshot.hp,
            max_hp: snapshot.max_hp,
            speed: snapshot.speed,
            team: snapshot.team,
            owner: snapshot.owner.clone(),
            cooldown_remaining: snapshot.cooldown_remaining,
            cooldown_total: snapshot.cooldown_total,
            movement: snapshot.movement.clone(),
            abilities: snapshot.abilities.clone(),
            active_abilities: snapshot.active_abilities.clone(),
            resources: snapshot
                .resources
                .iter()
                .map(Resource::from_snapshot)
                .collect(),
            ai_range: snapshot.ai_range,
            active: snapshot.hp > 0.0,
        }
    }

    pub fn attach_resources(&mut self, bus: &EventBus) {
        let owner = self.id;
        for resource in &mut self.resources {
            resource.attach(owner, bus);
        }
    }

    pub fn detach_resources(&mut self) {
        for resource in &mut self.resources {
            resource.detach();
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    pub fn base_speed(&self) -> f64 {
        self.speed
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn owner(&self) -> Option<&PlayerId> {
        self.owner.as_ref()
    }

    pub fn is_controllable(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.team != other.team
    }

    pub fn cooldown_remaining(&self) -> f64 {
        self.cooldown_remaining
    }

    pub fn cooldown_total(&self) -> f64 {
        self.cooldown_total
    }

    pub fn movement(&self) -> Option<&Movement> {
        self.movement.as_ref()
    }

    pub fn abilities(&self) -> &[AbilityId] {
        &self.abilities
    }

    pub fn knows(&self, ability: &AbilityId) -> bool {
        self.abilities.contains(ability)
    }

    pub fn active_abilities(&self) -> &[ActiveAbility] {
        &self.active_abilities
    }

    pub fn ai_range(&self) -> AiRange {
        self.ai_range
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.kind() == kind)
    }

    /// Applies damage and returns the hp actually removed.
    ///
    /// Emits `DamageTaken` when anything was removed and `UnitDied` once,
    /// on the hit that brings hp to zero.
    pub fn take_damage(&mut self, amount: f64, source: Option<EntityId>, bus: &EventBus) -> f64 {
        if !self.active || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }

        let dealt = amount.min(self.hp);
        self.hp = (self.hp - dealt).max(0.0);

        if dealt > 0.0 {
            bus.emit(&BattleEvent::DamageTaken {
                unit: self.id,
                amount: dealt,
                source,
            });
        }

        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.active = false;
            self.movement = None;
            tracing::debug!(unit = %self.id, source = ?source, "unit died");
            bus.emit(&BattleEvent::UnitDied {
                unit: self.id,
                source,
            });
        }

        dealt
    }

    /// Restores hp up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if !self.active || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let restored = amount.min(self.max_hp - self.hp);
        self.hp += restored;
        restored
    }

    /// Alive with no cooldown left.
    pub fn can_act(&self) -> bool {
        self.active && self.cooldown_remaining <= 0.0
    }

    pub fn start_cooldown(&mut self, duration: f64) {
        let duration = duration.max(0.0);
        self.cooldown_remaining = duration;
        self.cooldown_total = duration;
    }

    pub fn set_movement(&mut self, path: Vec<Point>, tracked_target: Option<EntityId>, tick: u64) {
        if path.is_empty() {
            self.movement = None;
            return;
        }
        self.movement = Some(Movement {
            path: path.into(),
            tracked_target,
            started_tick: tick,
        });
    }

    pub fn clear_movement(&mut self) {
        self.movement = None;
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        self.resource(cost.kind)
            .is_some_and(|resource| resource.can_afford(cost.amount))
    }

    /// Spends `cost` from the matching resource. Returns `false` if unaffordable.
    pub fn spend(&mut self, cost: &ResourceCost) -> bool {
        self.resource(cost.kind)
            .is_some_and(|resource| resource.try_spend(cost.amount))
    }

    pub fn push_active_ability(&mut self, active: ActiveAbility) {
        self.active_abilities.push(active);
    }

    pub fn retain_active_abilities(&mut self, keep: impl FnMut(&ActiveAbility) -> bool) {
        self.active_abilities.retain(keep);
    }

    /// States contributed by every currently active ability.
    pub fn active_states(
        &self,
        registry: &AbilityRegistry,
        config: &BattleConfig,
        tick: u64,
    ) -> Vec<AbilityState> {
        self.active_abilities
            .iter()
            .filter_map(|active| {
                registry
                    .get(&active.ability)
                    .map(|ability| ability.states(active.elapsed(tick, config)))
            })
            .flatten()
            .collect()
    }

    pub fn is_untouchable(&self, registry: &AbilityRegistry, config: &BattleConfig, tick: u64) -> bool {
        self.active_states(registry, config, tick)
            .contains(&AbilityState::Untouchable)
    }

    /// Base speed scaled by the most severe active movement penalty.
    ///
    /// Penalties do not stack: only the lowest multiplier applies.
    pub fn effective_speed(&self, registry: &AbilityRegistry, config: &BattleConfig, tick: u64) -> f64 {
        let penalty = self
            .active_states(registry, config, tick)
            .into_iter()
            .filter_map(|state| match state {
                AbilityState::MovementPenalty(multiplier) => Some(multiplier),
                _ => None,
            })
            .reduce(f64::min)
            .unwrap_or(1.0);

        self.speed * penalty.max(0.0)
    }

    fn advance_along_path(&mut self, budget: f64) {
        let Some(movement) = self.movement.as_mut() else {
            return;
        };

        let mut budget = budget;
        while budget > 0.0 {
            let Some(&next) = movement.path.front() else {
                break;
            };
            let distance = self.position.distance(next);
            if distance <= budget {
                self.position = next;
                budget -= distance;
                movement.path.pop_front();
            } else {
                self.position = self.position.move_toward(next, budget);
                budget = 0.0;
            }
        }

        if movement.path.is_empty() {
            self.movement = None;
        }
    }
}

impl Entity for Unit {
    type Context<'a> = UnitContext<'a>;
    type Snapshot = UnitSnapshot;

    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Point {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f64, ctx: UnitContext<'_>) {
        if !self.active {
            return;
        }

        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining -= dt;
            if self.cooldown_remaining < COOLDOWN_EPSILON {
                self.cooldown_remaining = 0.0;
            }
        }

        if self.movement.is_some() {
            let speed = self.effective_speed(ctx.registry, ctx.config, ctx.tick)
                * ctx.grid.speed_multiplier_at(self.position);
            self.advance_along_path(speed * dt);
        }
    }

    fn serialize(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            template: self.template.clone(),
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
            hp: self.hp,
            max_hp: self.max_hp,
            speed: self.speed,
            team: self.team,
            owner: self.owner.clone(),
            cooldown_remaining: self.cooldown_remaining,
            cooldown_total: self.cooldown_total,
            movement: self.movement.clone(),
            abilities: self.abilities.clone(),
            active_abilities: self.active_abilities.clone(),
            resources: self.resources.iter().map(Resource::snapshot).collect(),
            ai_range: self.ai_range,
        }
    }
}

/// Serialized form of a [`Unit`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSnapshot {
    pub id: EntityId,
    pub template: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub hp: f64,
    pub max_hp: f64,
    pub speed: f64,
    pub team: Team,
    pub owner: Option<PlayerId>,
    pub cooldown_remaining: f64,
    pub cooldown_total: f64,
    pub movement: Option<Movement>,
    pub abilities: Vec<AbilityId>,
    pub active_abilities: Vec<ActiveAbility>,
    pub resources: Vec<ResourceSnapshot>,
    pub ai_range: AiRange,
}
