use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ability::AbilityRegistry;
use crate::config::BattleConfig;
use crate::entity::{Effect, Entity, Projectile, Unit};
use crate::state::{AbilityId, EntityIdAllocator, SerializedGameState};
use crate::terrain::{Pathfinder, TerrainGrid};
use crate::world::BattleWorld;

use super::{BattleEngine, RestoreError};

/// Tolerance between the stored game time and the time implied by the tick.
const CLOCK_EPSILON: f64 = 1e-9;

/// Checkpoint encoding and decoding for BattleEngine.
impl BattleEngine {
    /// Captures every field the step function reads.
    pub fn serialize(&self) -> SerializedGameState {
        SerializedGameState {
            game_time: self.time(),
            game_tick: self.tick,
            round_number: self.round,
            snapshot_index: self.snapshot_index,
            seed: self.seed,
            next_entity_id: self.world.ids.peek(),
            units: self.world.units.iter().map(Entity::serialize).collect(),
            projectiles: self.world.projectiles.iter().map(Entity::serialize).collect(),
            effects: self.world.effects.iter().map(Entity::serialize).collect(),
            cards: self.cards.clone(),
            waiting_for_orders: self.waiting.clone(),
            pending_orders: self.pending_orders.clone(),
            last_order: self.last_order.clone(),
            orders_since_checkpoint: self.orders_since_checkpoint.clone(),
            outcome: self.outcome,
        }
    }

    /// Rebuilds an engine from a serialized state.
    ///
    /// Resources are re-subscribed to the fresh event bus. The real-time
    /// accumulator starts empty.
    pub fn restore(
        config: BattleConfig,
        registry: Arc<AbilityRegistry>,
        grid: Arc<TerrainGrid>,
        state: &SerializedGameState,
    ) -> Result<Self, RestoreError> {
        validate_state(&config, &registry, state)?;

        let mut world = BattleWorld {
            ids: EntityIdAllocator::starting_at(state.next_entity_id),
            ..BattleWorld::default()
        };
        for snapshot in &state.units {
            let mut unit = Unit::from_snapshot(snapshot);
            unit.attach_resources(&world.bus);
            world.units.push(unit);
        }
        world.projectiles = state.projectiles.iter().map(Projectile::from_snapshot).collect();
        world.effects = state.effects.iter().map(Effect::from_snapshot).collect();

        tracing::info!(
            tick = state.game_tick,
            round = state.round_number,
            units = world.units.len(),
            "restored battle state"
        );

        Ok(Self {
            pathfinder: Pathfinder::new(Arc::clone(&grid)),
            config,
            registry,
            grid,
            world,
            cards: state.cards.clone(),
            seed: state.seed,
            tick: state.game_tick,
            round: state.round_number,
            snapshot_index: state.snapshot_index,
            waiting: state.waiting_for_orders.clone(),
            pending_orders: state.pending_orders.clone(),
            last_order: state.last_order.clone(),
            orders_since_checkpoint: state.orders_since_checkpoint.clone(),
            outcome: state.outcome,
            accumulator: 0.0,
            outputs: Vec::new(),
        })
    }
}

fn validate_state(
    config: &BattleConfig,
    registry: &AbilityRegistry,
    state: &SerializedGameState,
) -> Result<(), RestoreError> {
    let expected_time = config.time_at(state.game_tick);
    if (state.game_time - expected_time).abs() > CLOCK_EPSILON {
        return Err(RestoreError::ClockMismatch {
            tick: state.game_tick,
            time: state.game_time,
        });
    }

    let check_ability = |id: &AbilityId| {
        if registry.is_known(id) {
            Ok(())
        } else {
            Err(RestoreError::UnknownAbility(id.clone()))
        }
    };
    for unit in &state.units {
        unit.abilities.iter().try_for_each(check_ability)?;
        unit.active_abilities
            .iter()
            .try_for_each(|active| check_ability(&active.ability))?;
    }
    for player in state.cards.players() {
        state
            .cards
            .cards(player)
            .iter()
            .try_for_each(|card| check_ability(&card.ability_id))?;
    }

    let ids = state
        .units
        .iter()
        .map(|unit| unit.id)
        .chain(state.projectiles.iter().map(|projectile| projectile.id))
        .chain(state.effects.iter().map(|effect| effect.id));
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(RestoreError::DuplicateEntity(id));
        }
    }
    if let Some(&highest) = seen.last() {
        if state.next_entity_id <= highest.0 {
            return Err(RestoreError::StaleIdCounter {
                next: state.next_entity_id,
                existing: highest,
            });
        }
    }

    if let Some(waiting) = &state.waiting_for_orders {
        if state.unit(waiting.unit_id).is_none() {
            return Err(RestoreError::MissingWaitingUnit(waiting.unit_id));
        }
    }

    Ok(())
}
