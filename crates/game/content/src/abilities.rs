//! Data-driven ability behaviour.
//!
//! Every ability in `abilities.ron` pairs a core [`AbilityDescriptor`] with one
//! [`AbilityEffect`] variant. The variant decides what happens inside each
//! elapsed-time window; one-shot parts fire through [`crossed`].

use battle_core::ability::TIME_EPSILON;
use battle_core::{
    crossed, Ability, AbilityDescriptor, AbilityState, EffectContext, Entity, EntityId,
    Point, ProjectileSpec, ResolvedTarget, Unit,
};
use serde::{Deserialize, Serialize};

/// How long the marker left by melee hits and heals lasts.
const HIT_MARKER_SECONDS: f64 = 0.25;

fn full_speed() -> f64 {
    1.0
}

/// Time-phased behaviour of a content ability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Melee hit on the first target at prefire, optionally pushing it away.
    Strike {
        damage: f64,
        #[serde(default)]
        knockback: f64,
    },
    /// Single projectile fired at prefire toward the first target.
    ///
    /// With `lock_time` the aim is marked at that moment; until the shot the
    /// caster moves at `movement_penalty` of its speed.
    Bolt {
        damage: f64,
        speed: f64,
        radius: f64,
        max_distance: f64,
        #[serde(default)]
        lock_time: Option<f64>,
        #[serde(default = "full_speed")]
        movement_penalty: f64,
    },
    /// `count` projectiles fanned over `spread` degrees around the aim.
    Volley {
        damage: f64,
        count: u32,
        spread: f64,
        speed: f64,
        radius: f64,
        max_distance: f64,
    },
    /// Caster is untouchable from activation until `duration` after prefire.
    Guard { duration: f64 },
    /// Caster jumps to the target point at prefire and stays untouchable for
    /// `untouchable` seconds afterwards.
    Blink { untouchable: f64 },
    /// Restores hp to the first target at prefire.
    Mend { amount: f64 },
}

/// An ability definition as stored in content files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentAbility {
    pub descriptor: AbilityDescriptor,
    pub effect: AbilityEffect,
}

impl ContentAbility {
    pub fn new(descriptor: AbilityDescriptor, effect: AbilityEffect) -> Self {
        Self { descriptor, effect }
    }

    /// Elapsed time after which lingering states end, if the effect has any.
    fn linger_until(&self) -> Option<f64> {
        let prefire = self.descriptor.prefire_time;
        match self.effect {
            AbilityEffect::Guard { duration } => Some(prefire + duration),
            AbilityEffect::Blink { untouchable } => Some(prefire + untouchable),
            _ => None,
        }
    }

    fn fire_projectiles(
        &self,
        ctx: &mut EffectContext<'_>,
        caster: EntityId,
        targets: &[ResolvedTarget],
    ) {
        let Some(unit) = ctx.unit(caster) else {
            return;
        };
        let origin = unit.position();
        let team = unit.team();
        let Some(aim) = targets.first().and_then(|target| ctx.target_point(target)) else {
            return;
        };
        let Some(direction) = (aim - origin).normalized() else {
            return;
        };

        let (damage, speed, radius, max_distance, directions) = match self.effect {
            AbilityEffect::Bolt {
                damage,
                speed,
                radius,
                max_distance,
                ..
            } => (damage, speed, radius, max_distance, vec![direction]),
            AbilityEffect::Volley {
                damage,
                count,
                spread,
                speed,
                radius,
                max_distance,
            } => (damage, speed, radius, max_distance, fan(direction, count, spread)),
            _ => return,
        };

        for direction in directions {
            ctx.spawn_projectile(ProjectileSpec {
                position: origin,
                direction,
                speed,
                radius,
                damage,
                max_distance,
                source_team: team,
                source_unit: caster,
            });
        }
        tracing::trace!(ability = %self.descriptor.id, %caster, "projectiles fired");
    }
}

/// Unit directions spread evenly over `spread_degrees`, centred on `aim`.
fn fan(aim: Point, count: u32, spread_degrees: f64) -> Vec<Point> {
    if count <= 1 {
        return vec![aim];
    }
    let base = aim.y.atan2(aim.x);
    let spread = spread_degrees.to_radians();
    (0..count)
        .map(|index| {
            let offset = spread * (f64::from(index) / f64::from(count - 1) - 0.5);
            let angle = base + offset;
            Point::new(angle.cos(), angle.sin())
        })
        .collect()
}

impl Ability for ContentAbility {
    fn descriptor(&self) -> &AbilityDescriptor {
        &self.descriptor
    }

    fn description(&self, caster: Option<&Unit>) -> String {
        let mut text = match &self.effect {
            AbilityEffect::Strike { damage, knockback } if *knockback > 0.0 => {
                format!("Deals {damage} damage and knocks the target back {knockback} px.")
            }
            AbilityEffect::Strike { damage, .. } => format!("Deals {damage} damage."),
            AbilityEffect::Bolt {
                damage,
                max_distance,
                ..
            } => format!("Launches a bolt dealing {damage} damage, range {max_distance} px."),
            AbilityEffect::Volley { damage, count, .. } => {
                format!("Fires {count} arrows dealing {damage} damage each.")
            }
            AbilityEffect::Guard { duration } => {
                format!("Ignores all damage for {duration} s.")
            }
            AbilityEffect::Blink { untouchable } => {
                format!("Steps to the target point, untouchable for {untouchable} s.")
            }
            AbilityEffect::Mend { amount } => format!("Restores {amount} hp to an ally."),
        };
        text.push_str(&format!(" Cooldown {} s.", self.descriptor.cooldown));

        if let Some(cost) = &self.descriptor.cost {
            text.push_str(&format!(" Costs {} {}", cost.amount, cost.kind));
            match caster.and_then(|unit| unit.resource(cost.kind)) {
                Some(resource) => text.push_str(&format!(" ({:.0} available).", resource.current())),
                None => text.push('.'),
            }
        }
        text
    }

    fn apply(
        &self,
        ctx: &mut EffectContext<'_>,
        caster: EntityId,
        targets: &[ResolvedTarget],
        prev_time: f64,
        current_time: f64,
    ) {
        let prefire = self.descriptor.prefire_time;

        if let AbilityEffect::Bolt {
            lock_time: Some(lock),
            ..
        } = self.effect
        {
            if crossed(prev_time, current_time, lock) {
                if let Some(aim) = targets.first().and_then(|target| ctx.target_point(target)) {
                    let marker = format!("{}_lock", self.descriptor.id);
                    ctx.spawn_effect(&marker, aim, (prefire - lock).max(0.0));
                }
            }
        }

        if !crossed(prev_time, current_time, prefire) {
            return;
        }

        match self.effect {
            AbilityEffect::Strike { damage, knockback } => {
                let Some(target) = targets.first().and_then(ResolvedTarget::unit) else {
                    return;
                };
                let Some(position) = ctx.unit(target).map(Entity::position) else {
                    return;
                };
                let untouchable = ctx.is_untouchable(target);
                ctx.deal_damage(target, damage, Some(caster));
                ctx.spawn_effect(self.descriptor.id.as_str(), position, HIT_MARKER_SECONDS);

                if knockback > 0.0 && !untouchable {
                    let from = ctx.unit(caster).map(Entity::position);
                    let push = from.and_then(|from| (position - from).normalized());
                    if let Some(push) = push {
                        let destination = position + push * knockback;
                        if ctx.grid().is_point_passable(destination) {
                            if let Some(unit) = ctx.unit_mut(target).filter(|unit| unit.is_active()) {
                                unit.set_position(destination);
                            }
                        }
                    }
                }
            }
            AbilityEffect::Bolt { .. } | AbilityEffect::Volley { .. } => {
                self.fire_projectiles(ctx, caster, targets);
            }
            AbilityEffect::Guard { duration } => {
                if let Some(position) = ctx.unit(caster).map(Entity::position) {
                    ctx.spawn_effect(self.descriptor.id.as_str(), position, duration);
                }
            }
            AbilityEffect::Blink { .. } => {
                let Some(destination) = targets.first().and_then(|target| ctx.target_point(target))
                else {
                    return;
                };
                if !ctx.grid().is_point_passable(destination) {
                    tracing::debug!(%caster, %destination, "blink target blocked");
                    return;
                }
                if let Some(unit) = ctx.unit_mut(caster) {
                    unit.set_position(destination);
                    unit.clear_movement();
                }
                ctx.spawn_effect(self.descriptor.id.as_str(), destination, HIT_MARKER_SECONDS);
            }
            AbilityEffect::Mend { amount } => {
                let Some(target) = targets.first().and_then(ResolvedTarget::unit) else {
                    return;
                };
                if let Some(position) = ctx.unit(target).map(Entity::position) {
                    ctx.heal(target, amount);
                    ctx.spawn_effect(self.descriptor.id.as_str(), position, HIT_MARKER_SECONDS);
                }
            }
        }
    }

    fn states(&self, elapsed: f64) -> Vec<AbilityState> {
        if let Some(until) = self.linger_until() {
            if elapsed + TIME_EPSILON < until {
                return vec![AbilityState::Untouchable];
            }
            return Vec::new();
        }

        match self.effect {
            AbilityEffect::Bolt {
                movement_penalty, ..
            } if movement_penalty < 1.0 && elapsed + TIME_EPSILON < self.descriptor.prefire_time => {
                vec![AbilityState::MovementPenalty(movement_penalty)]
            }
            _ => Vec::new(),
        }
    }
}
