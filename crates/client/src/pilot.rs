//! Scripted stand-in for a human player.
//!
//! Plays the first card whose ability has a target in reach, choosing
//! targets the way a player would: by clicking on the map.

use battle_core::{
    AbilityDescriptor, BattleEngine, Entity, EntityId, Order, Point, TargetKind, TargetSelection,
    Unit,
};

/// Order for the unit the engine is waiting on, or `None` when not paused.
pub fn choose_order(engine: &BattleEngine) -> Option<Order> {
    let waiting = engine.waiting_for_orders()?;
    let unit = engine.unit(waiting.unit_id)?;

    let order = unit
        .abilities()
        .iter()
        .filter(|ability| engine.cards().has_in_hand(&waiting.owner_id, ability))
        .filter_map(|ability| engine.registry().descriptor(ability))
        .filter(|descriptor| {
            descriptor
                .cost
                .as_ref()
                .is_none_or(|cost| unit.can_afford(cost))
        })
        .find_map(|descriptor| {
            let targets = pick_targets(engine, unit, descriptor)?;
            let order = Order::ability(unit.id(), descriptor.id.clone(), targets);
            engine.validate_order(&order).ok().map(|()| order)
        });

    Some(order.unwrap_or_else(|| Order::wait(unit.id())))
}

fn pick_targets(
    engine: &BattleEngine,
    caster: &Unit,
    descriptor: &AbilityDescriptor,
) -> Option<Vec<battle_core::ResolvedTarget>> {
    let mut selection = TargetSelection::new(descriptor.targets.clone());
    for kind in &descriptor.targets {
        let click = match kind {
            TargetKind::Unit | TargetKind::Pixel => nearest_enemy(engine, caster, descriptor)?,
            TargetKind::Player => most_injured_ally(engine, caster)?,
        };
        selection.click(click, engine.units()).ok()?;
    }
    Some(selection.into_targets())
}

fn nearest_enemy(engine: &BattleEngine, caster: &Unit, descriptor: &AbilityDescriptor) -> Option<Point> {
    let origin = caster.position();
    engine
        .units()
        .iter()
        .filter(|unit| unit.is_active() && unit.is_enemy_of(caster))
        .map(|unit| (unit.position(), origin.distance(unit.position())))
        .filter(|(_, distance)| descriptor.ai_range.contains(*distance))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(position, _)| position)
}

fn most_injured_ally(engine: &BattleEngine, caster: &Unit) -> Option<Point> {
    engine
        .units()
        .iter()
        .filter(|unit| unit.is_active() && unit.is_controllable() && !unit.is_enemy_of(caster))
        .filter(|unit| unit.hp() < unit.max_hp())
        .min_by(|a, b| (a.hp() / a.max_hp()).total_cmp(&(b.hp() / b.max_hp())))
        .map(Entity::position)
}

/// Units this player still controls.
pub fn living_units(engine: &BattleEngine, player: &battle_core::PlayerId) -> Vec<EntityId> {
    engine
        .units()
        .iter()
        .filter(|unit| unit.is_active() && unit.owner() == Some(player))
        .map(Unit::id)
        .collect()
}
