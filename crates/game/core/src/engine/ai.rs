//! Turn logic for units without an owner.
//!
//! Every random choice is seeded from replicated state via [`compute_seed`],
//! so all clients pick the same enemy and the same ability.

use crate::ability::{ResolvedTarget, TargetKind};
use crate::entity::{Entity, Unit};
use crate::rng::{compute_seed, PcgRng, RngOracle};
use crate::state::{EntityId, Point};

use super::{BattleEngine, Order};

/// Seed context for the enemy the unit positions against.
const CONTEXT_MOVE_TARGET: u32 = 0;
/// Seed context base for ability targets; the ability's slot is added.
const CONTEXT_ABILITY_TARGET: u32 = 1;

#[derive(Clone, Copy, Debug)]
struct EnemyView {
    id: EntityId,
    position: Point,
    controllable: bool,
}

impl BattleEngine {
    pub(super) fn take_ai_turn(&mut self, unit_id: EntityId) {
        let order = self.decide_ai_order(unit_id);
        tracing::debug!(unit = %unit_id, ability = %order.ability_id, tick = self.tick, "ai turn");
        self.resolve_turn(&order);
    }

    fn decide_ai_order(&mut self, unit_id: EntityId) -> Order {
        let Some(unit) = self.world.unit(unit_id) else {
            return Order::wait(unit_id);
        };
        let position = unit.position();
        let team = unit.team();
        let range = unit.ai_range();

        let enemies: Vec<EnemyView> = self
            .world
            .living_units()
            .filter(|other| other.team() != team)
            .map(|other| EnemyView {
                id: other.id(),
                position: other.position(),
                controllable: other.is_controllable(),
            })
            .collect();

        let seed = compute_seed(self.seed, self.tick, unit_id.0, CONTEXT_MOVE_TARGET);
        let Some(&focus) = PcgRng.pick(seed, &enemies) else {
            return Order::wait(unit_id);
        };

        if !range.contains(position.distance(focus.position)) {
            let away = (position - focus.position)
                .normalized()
                .unwrap_or(Point::new(1.0, 0.0));
            let destination = focus.position + away * range.midpoint();
            let path = self.plan_ai_path(unit_id, focus.id, position, destination);
            let tick = self.tick;
            if let Some(unit) = self.world.unit_mut(unit_id) {
                match path {
                    Some(path) => unit.set_movement(path, Some(focus.id), tick),
                    None => unit.clear_movement(),
                }
            }
        }

        self.choose_ability(unit_id, position, &enemies)
            .unwrap_or_else(|| Order::wait(unit_id))
    }

    /// Reuses the current path when it still tracks `target`: keeps it up to
    /// the waypoint nearest `destination` and appends a fresh tail from there.
    fn plan_ai_path(
        &mut self,
        unit_id: EntityId,
        target: EntityId,
        position: Point,
        destination: Point,
    ) -> Option<Vec<Point>> {
        let reusable: Option<Vec<Point>> = self
            .world
            .unit(unit_id)
            .and_then(Unit::movement)
            .filter(|movement| movement.tracked_target == Some(target) && !movement.path.is_empty())
            .map(|movement| movement.path.iter().copied().collect());

        if let Some(existing) = reusable {
            let nearest = existing
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.distance(destination).total_cmp(&b.distance(destination))
                })
                .map(|(index, _)| index);

            if let Some(nearest) = nearest {
                let mut path: Vec<Point> = existing[..=nearest].to_vec();
                let anchor = existing[nearest];
                if let Some(tail) = self.pathfinder.find_path(anchor, destination) {
                    path.extend(tail);
                    return Some(path);
                }
            }
        }

        self.pathfinder.find_path(position, destination)
    }

    /// First ability, in declared order, that is affordable and has an
    /// eligible enemy within its AI range.
    fn choose_ability(
        &self,
        unit_id: EntityId,
        position: Point,
        enemies: &[EnemyView],
    ) -> Option<Order> {
        let unit = self.world.unit(unit_id)?;

        for (slot, ability_id) in unit.abilities().iter().enumerate() {
            let Some(descriptor) = self.registry.descriptor(ability_id) else {
                continue;
            };
            if descriptor
                .cost
                .as_ref()
                .is_some_and(|cost| !unit.can_afford(cost))
            {
                continue;
            }

            let needs_player = descriptor.targets.first() == Some(&TargetKind::Player);
            let eligible: Vec<EnemyView> = enemies
                .iter()
                .filter(|enemy| descriptor.ai_range.contains(position.distance(enemy.position)))
                .filter(|enemy| !needs_player || enemy.controllable)
                .copied()
                .collect();

            let context = CONTEXT_ABILITY_TARGET.wrapping_add(slot as u32);
            let seed = compute_seed(self.seed, self.tick, unit_id.0, context);
            let Some(target) = PcgRng.pick(seed, &eligible) else {
                continue;
            };

            let targets = descriptor
                .targets
                .iter()
                .map(|kind| match kind {
                    TargetKind::Player => ResolvedTarget::Player { unit: target.id },
                    TargetKind::Unit => ResolvedTarget::Unit { unit: target.id },
                    TargetKind::Pixel => ResolvedTarget::pixel(target.position),
                })
                .collect();

            return Some(Order::ability(unit_id, ability_id.clone(), targets));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ability::AbilityRegistry;
    use crate::config::BattleConfig;
    use crate::entity::UnitSpec;
    use crate::state::{AbilityId, Team};
    use crate::testing::{open_grid, spec, Strike};

    fn engine_with(abilities: Vec<Strike>) -> BattleEngine {
        let registry = abilities
            .into_iter()
            .try_fold(AbilityRegistry::builder(), |builder, ability| builder.register(ability))
            .expect("abilities register")
            .build();
        BattleEngine::new(BattleConfig::default(), Arc::new(registry), open_grid(), 17)
    }

    fn goblin_spec(abilities: &[&str], position: Point) -> UnitSpec {
        UnitSpec {
            abilities: abilities.iter().map(|id| AbilityId::new(*id)).collect(),
            initial_cooldown: 5.0,
            ..spec(Team::ENEMIES, None, position)
        }
    }

    fn knight_spec(position: Point) -> UnitSpec {
        UnitSpec {
            initial_cooldown: 5.0,
            ..spec(Team::PLAYERS, Some("alice"), position)
        }
    }

    #[test]
    fn stays_put_inside_the_preferred_band() {
        let mut engine = engine_with(vec![Strike::new("strike", 10.0)]);
        let knight = engine.spawn_unit(knight_spec(Point::new(100.0, 200.0)));
        let goblin = engine.spawn_unit(goblin_spec(&["strike"], Point::new(130.0, 200.0)));

        let order = engine.decide_ai_order(goblin);
        assert!(engine.unit(goblin).and_then(Unit::movement).is_none());
        assert_eq!(order.ability_id, AbilityId::new("strike"));
        assert_eq!(order.targets, vec![ResolvedTarget::Unit { unit: knight }]);
    }

    #[test]
    fn closes_in_when_outside_the_band_and_waits_without_a_target() {
        let mut engine = engine_with(vec![Strike::new("strike", 10.0)]);
        let knight = engine.spawn_unit(knight_spec(Point::new(100.0, 200.0)));
        let goblin = engine.spawn_unit(goblin_spec(&["strike"], Point::new(400.0, 200.0)));

        engine.take_ai_turn(goblin);

        let unit = engine.unit(goblin).expect("goblin alive");
        let movement = unit.movement().expect("goblin moves");
        assert_eq!(movement.tracked_target, Some(knight));
        // Midpoint of the 0..48 band, on the goblin's side of the knight.
        assert_eq!(movement.path.back(), Some(&Point::new(124.0, 200.0)));

        assert!(unit.active_abilities().is_empty());
        assert_eq!(unit.cooldown_remaining(), engine.config().wait_cooldown);
    }

    #[test]
    fn first_eligible_ability_in_declared_order_wins() {
        let mut engine = engine_with(vec![
            Strike::new("volley", 6.0).with_ai_range(100.0, 400.0),
            Strike::new("strike", 10.0),
            Strike::new("jab", 4.0),
        ]);
        engine.spawn_unit(knight_spec(Point::new(100.0, 200.0)));
        let near = engine.spawn_unit(goblin_spec(&["volley", "strike", "jab"], Point::new(130.0, 200.0)));
        let far = engine.spawn_unit(goblin_spec(&["volley", "strike", "jab"], Point::new(300.0, 200.0)));

        assert_eq!(engine.decide_ai_order(near).ability_id, AbilityId::new("strike"));
        assert_eq!(engine.decide_ai_order(far).ability_id, AbilityId::new("volley"));
    }

    #[test]
    fn player_requirement_needs_a_controlled_enemy() {
        let mut engine = engine_with(vec![
            Strike::new("hex", 5.0)
                .with_targets(vec![TargetKind::Player])
                .with_ai_range(0.0, 400.0),
        ]);
        let escort = engine.spawn_unit(UnitSpec {
            initial_cooldown: 5.0,
            ..spec(Team::PLAYERS, None, Point::new(150.0, 200.0))
        });
        let goblin = engine.spawn_unit(goblin_spec(&["hex"], Point::new(170.0, 200.0)));
        assert!(engine.unit(escort).is_some_and(|unit| !unit.is_controllable()));

        assert!(engine.decide_ai_order(goblin).is_wait());

        let knight = engine.spawn_unit(knight_spec(Point::new(100.0, 200.0)));
        let order = engine.decide_ai_order(goblin);
        assert_eq!(order.ability_id, AbilityId::new("hex"));
        assert_eq!(order.targets, vec![ResolvedTarget::Player { unit: knight }]);
    }

    #[test]
    fn path_is_trimmed_and_reused_while_tracking_the_same_enemy() {
        let mut engine = engine_with(vec![Strike::new("strike", 10.0)]);
        let knight = engine.spawn_unit(knight_spec(Point::new(100.0, 200.0)));
        let other = engine.spawn_unit(knight_spec(Point::new(100.0, 300.0)));
        let goblin = engine.spawn_unit(goblin_spec(&["strike"], Point::new(400.0, 200.0)));

        let existing = vec![
            Point::new(300.0, 200.0),
            Point::new(200.0, 200.0),
            Point::new(150.0, 200.0),
            Point::new(150.0, 100.0),
        ];
        engine
            .world
            .unit_mut(goblin)
            .expect("goblin")
            .set_movement(existing.clone(), Some(knight), 0);

        let start = Point::new(400.0, 200.0);
        let destination = Point::new(124.0, 200.0);
        let reused = engine
            .plan_ai_path(goblin, knight, start, destination)
            .expect("path found");
        assert!(reused.starts_with(&existing[..3]));
        assert!(!reused.contains(&existing[3]));
        assert_eq!(reused.last(), Some(&destination));

        let fresh = engine
            .plan_ai_path(goblin, other, start, destination)
            .expect("path found");
        assert!(!fresh.contains(&existing[0]));
        assert_eq!(fresh.last(), Some(&destination));
    }
}
