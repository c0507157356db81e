//! Fixed-step battle simulation and its turn-pause scheduler.
//!
//! The [`BattleEngine`] is either **running** (real time accumulates and is
//! drained in whole fixed steps) or **paused for orders** (one controllable
//! unit is ready and `waiting_for_orders` is set; simulated time stands still).
//! Applying an order, local or replayed, resumes it.
//!
//! One step runs, in order:
//! 1. unit updates (cooldowns, movement)
//! 2. active abilities: time-phased effects, then removal of finished ones
//! 3. projectiles (movement, collision), impacts become effects
//! 4. effects
//! 5. pruning of deactivated entities and the battle-outcome check
//! 6. round boundaries
//! 7. scheduling: ready AI units act, then the first ready controllable unit pauses
//! 8. checkpoint emission every `checkpoint_interval_ticks`

mod ai;
mod errors;
mod order;
mod rounds;
mod serialize;
mod turns;

pub use errors::{OrderError, RestoreError};
pub use order::{BattleOutcome, Order, OrderKey, TimedOrder, WaitingForOrders};

use std::sync::Arc;

use crate::ability::{AbilityRegistry, EffectContext};
use crate::cards::{CardDefinition, CardPiles};
use crate::config::BattleConfig;
use crate::entity::{
    ActiveAbility, Effect, Entity, Projectile, ProjectileContext, Unit, UnitContext, UnitSpec,
};
use crate::events::EventBus;
use crate::state::{EntityId, PlayerId, Point, SerializedGameState};
use crate::terrain::{Pathfinder, TerrainGrid};
use crate::world::BattleWorld;

/// Accumulated time within this of a full step still drains it.
const STEP_EPSILON: f64 = 1e-9;

/// How long the marker left by a projectile impact lasts.
const IMPACT_EFFECT_SECONDS: f64 = 0.3;

/// Full snapshot emitted at a checkpoint tick.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointOutput {
    pub tick: u64,
    pub state: Box<SerializedGameState>,
    /// Orders applied since the previous checkpoint.
    pub orders: Vec<TimedOrder>,
}

/// Notable transitions surfaced to the runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineOutput {
    Checkpoint(CheckpointOutput),
    RoundEnded { round: u32 },
    AwaitingOrders(WaitingForOrders),
    BattleEnded(BattleOutcome),
}

/// Deterministic battle simulation owned by one client.
pub struct BattleEngine {
    config: BattleConfig,
    registry: Arc<AbilityRegistry>,
    grid: Arc<TerrainGrid>,
    pathfinder: Pathfinder,
    world: BattleWorld,
    cards: CardPiles,
    seed: u64,
    tick: u64,
    round: u32,
    snapshot_index: u64,
    waiting: Option<WaitingForOrders>,
    pending_orders: Vec<TimedOrder>,
    last_order: Option<TimedOrder>,
    orders_since_checkpoint: Vec<TimedOrder>,
    outcome: Option<BattleOutcome>,
    accumulator: f64,
    outputs: Vec<EngineOutput>,
}

impl BattleEngine {
    /// Creates an empty battle at tick 0, round 1.
    pub fn new(
        config: BattleConfig,
        registry: Arc<AbilityRegistry>,
        grid: Arc<TerrainGrid>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            registry,
            pathfinder: Pathfinder::new(Arc::clone(&grid)),
            grid,
            world: BattleWorld::new(),
            cards: CardPiles::new(),
            seed,
            tick: 0,
            round: 1,
            snapshot_index: 0,
            waiting: None,
            pending_orders: Vec::new(),
            last_order: None,
            orders_since_checkpoint: Vec::new(),
            outcome: None,
            accumulator: 0.0,
            outputs: Vec::new(),
        }
    }

    pub fn spawn_unit(&mut self, spec: UnitSpec) -> EntityId {
        let id = self.world.spawn_unit(spec);
        tracing::debug!(unit = %id, "spawned unit");
        id
    }

    /// Gives `player` their cards and an opening hand.
    pub fn add_player_cards(&mut self, player: PlayerId, definitions: &[CardDefinition]) {
        self.cards
            .add_player(player, definitions, self.config.hand_size);
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AbilityRegistry> {
        &self.registry
    }

    pub fn grid(&self) -> &Arc<TerrainGrid> {
        &self.grid
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds, derived from the tick count.
    pub fn time(&self) -> f64 {
        self.config.time_at(self.tick)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn snapshot_index(&self) -> u64 {
        self.snapshot_index
    }

    pub fn waiting_for_orders(&self) -> Option<&WaitingForOrders> {
        self.waiting.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.waiting.is_some()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn units(&self) -> &[Unit] {
        &self.world.units
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.world.unit(id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.world.projectiles
    }

    pub fn effects(&self) -> &[Effect] {
        &self.world.effects
    }

    pub fn cards(&self) -> &CardPiles {
        &self.cards
    }

    pub fn bus(&self) -> &EventBus {
        &self.world.bus
    }

    pub fn last_order(&self) -> Option<&TimedOrder> {
        self.last_order.as_ref()
    }

    pub fn pending_orders(&self) -> &[TimedOrder] {
        &self.pending_orders
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Plans a walk for `unit` to `destination`, for building move orders.
    pub fn plan_path(&mut self, unit: EntityId, destination: Point) -> Option<Vec<Point>> {
        let from = self.world.unit(unit)?.position();
        self.pathfinder.find_path(from, destination)
    }

    /// Feeds one frame of real time and drains whole steps.
    ///
    /// The delta is capped at `max_frame_delta`. While paused, time keeps
    /// accumulating (capped) but no step runs.
    pub fn advance(&mut self, real_dt: f64) -> Vec<EngineOutput> {
        let max = self.config.max_frame_delta;
        let dt = if real_dt.is_finite() {
            real_dt.clamp(0.0, max)
        } else {
            0.0
        };

        self.apply_pending_orders();

        if self.outcome.is_some() {
            return self.take_outputs();
        }
        if self.waiting.is_some() {
            self.accumulator = (self.accumulator + dt).min(max);
            return self.take_outputs();
        }

        self.accumulator += dt;
        let step = self.config.tick_duration();
        while self.accumulator + STEP_EPSILON >= step {
            self.accumulator -= step;
            self.step_once();

            if self.waiting.is_some() {
                self.apply_pending_orders();
            }
            if self.waiting.is_some() || self.outcome.is_some() {
                break;
            }
        }
        self.accumulator = self.accumulator.clamp(0.0, max);

        self.take_outputs()
    }

    /// Runs exactly one step unless paused or finished.
    pub fn step(&mut self) -> Vec<EngineOutput> {
        self.step_once();
        self.take_outputs()
    }

    /// Steps without real-time pacing until paused, finished, or `max_ticks` elapse.
    pub fn run_until_paused(&mut self, max_ticks: u64) -> Vec<EngineOutput> {
        for _ in 0..max_ticks {
            if self.waiting.is_some() || self.outcome.is_some() {
                break;
            }
            self.step_once();
        }
        self.take_outputs()
    }

    /// Outputs raised outside of `advance` (e.g. by applying an order).
    pub fn take_outputs(&mut self) -> Vec<EngineOutput> {
        std::mem::take(&mut self.outputs)
    }

    fn step_once(&mut self) {
        if self.waiting.is_some() || self.outcome.is_some() {
            return;
        }

        self.tick += 1;
        let tick = self.tick;
        let dt = self.config.tick_duration();

        let unit_ctx = UnitContext {
            grid: &self.grid,
            registry: &self.registry,
            config: &self.config,
            tick,
        };
        for unit in &mut self.world.units {
            unit.update(dt, unit_ctx);
        }

        self.tick_abilities(tick);
        self.tick_projectiles(tick, dt);
        for effect in &mut self.world.effects {
            effect.update(dt, ());
        }

        self.world.prune();
        if self.check_outcome() {
            return;
        }

        self.process_round_ends();
        self.run_ai_turns();
        self.refresh_waiting();

        if self.config.is_checkpoint(tick) {
            self.emit_checkpoint();
        }
    }

    fn tick_abilities(&mut self, tick: u64) {
        let work: Vec<(EntityId, ActiveAbility)> = self
            .world
            .living_units()
            .flat_map(|unit| {
                unit.active_abilities()
                    .iter()
                    .map(move |active| (unit.id(), active.clone()))
            })
            .collect();

        for (caster, active) in &work {
            let Some(ability) = self.registry.get(&active.ability) else {
                continue;
            };
            if !self.world.unit(*caster).is_some_and(Unit::is_active) {
                continue;
            }
            let prev_time = active.elapsed(tick - 1, &self.config);
            let current_time = active.elapsed(tick, &self.config);
            let mut ctx = EffectContext::new(
                &mut self.world,
                &self.registry,
                &self.grid,
                &self.config,
                tick,
            );
            ability.apply(&mut ctx, *caster, &active.targets, prev_time, current_time);
        }

        let registry = &self.registry;
        let config = &self.config;
        for unit in &mut self.world.units {
            unit.retain_active_abilities(|active| {
                registry
                    .get(&active.ability)
                    .is_some_and(|ability| !ability.is_finished(active.elapsed(tick, config)))
            });
        }
    }

    fn tick_projectiles(&mut self, tick: u64, dt: f64) {
        if self.world.projectiles.is_empty() {
            return;
        }

        let untouchable = self
            .world
            .untouchable_units(&self.registry, &self.config, tick);
        let mut impacts = Vec::new();
        let BattleWorld {
            units,
            projectiles,
            bus,
            ..
        } = &mut self.world;

        for projectile in projectiles.iter_mut() {
            projectile.update(
                dt,
                ProjectileContext {
                    units: units.as_mut_slice(),
                    untouchable: &untouchable,
                    bus: &*bus,
                    impacts: &mut impacts,
                },
            );
        }

        for impact in impacts {
            self.world
                .spawn_effect("impact", impact.position, IMPACT_EFFECT_SECONDS);
        }
    }

    fn emit_checkpoint(&mut self) {
        self.snapshot_index += 1;
        let orders = std::mem::take(&mut self.orders_since_checkpoint);
        let state = Box::new(self.serialize());
        tracing::debug!(
            tick = self.tick,
            snapshot_index = self.snapshot_index,
            orders = orders.len(),
            "checkpoint"
        );
        self.outputs.push(EngineOutput::Checkpoint(CheckpointOutput {
            tick: self.tick,
            state,
            orders,
        }));
    }
}
