use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::unit::Unit;
use super::Entity;
use crate::events::EventBus;
use crate::state::{EntityId, Point, Team};

/// Accumulated distance within this of `max_distance` counts as exhausted.
const DISTANCE_EPSILON: f64 = 1e-9;

/// Spawn parameters for a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSpec {
    pub position: Point,
    /// Direction of travel; normalized on spawn.
    pub direction: Point,
    pub speed: f64,
    pub radius: f64,
    pub damage: f64,
    pub max_distance: f64,
    pub source_team: Team,
    pub source_unit: EntityId,
}

/// A projectile hitting a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Impact {
    pub projectile: EntityId,
    pub target: EntityId,
    pub position: Point,
    /// Zero when the target was untouchable.
    pub dealt: f64,
}

/// Mutable world view for [`Projectile::update`].
pub struct ProjectileContext<'a> {
    pub units: &'a mut [Unit],
    /// Units that currently consume projectiles without taking damage.
    pub untouchable: &'a BTreeSet<EntityId>,
    pub bus: &'a EventBus,
    pub impacts: &'a mut Vec<Impact>,
}

/// Ballistic hazard travelling in a straight line.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    id: EntityId,
    position: Point,
    velocity: Point,
    radius: f64,
    damage: f64,
    source_team: Team,
    source_unit: EntityId,
    max_distance: f64,
    distance_traveled: f64,
    active: bool,
}

impl Projectile {
    pub fn new(id: EntityId, spec: ProjectileSpec) -> Self {
        let direction = spec.direction.normalized().unwrap_or(Point::new(1.0, 0.0));
        Self {
            id,
            position: spec.position,
            velocity: direction * spec.speed,
            radius: spec.radius,
            damage: spec.damage,
            source_team: spec.source_team,
            source_unit: spec.source_unit,
            max_distance: spec.max_distance,
            distance_traveled: 0.0,
            active: spec.max_distance > 0.0,
        }
    }

    pub fn from_snapshot(snapshot: &ProjectileSnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: Point::new(snapshot.x, snapshot.y),
            velocity: Point::new(snapshot.vx, snapshot.vy),
            radius: snapshot.radius,
            damage: snapshot.damage,
            source_team: snapshot.source_team,
            source_unit: snapshot.source_unit,
            max_distance: snapshot.max_distance,
            distance_traveled: snapshot.distance_traveled,
            active: true,
        }
    }

    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }

    fn advance(&mut self, dt: f64) {
        let remaining = (self.max_distance - self.distance_traveled).max(0.0);
        let step = (self.velocity.length() * dt).min(remaining);
        if let Some(direction) = self.velocity.normalized() {
            self.position += direction * step;
        }
        self.distance_traveled += step;
        if self.distance_traveled >= self.max_distance - DISTANCE_EPSILON {
            self.distance_traveled = self.max_distance;
        }
    }

    /// First living enemy whose hit circle overlaps ours, in iteration order.
    fn first_hit(&self, units: &[Unit]) -> Option<usize> {
        units.iter().position(|unit| {
            unit.is_active()
                && unit.team() != self.source_team
                && unit.position().distance(self.position) <= self.radius + unit.radius()
        })
    }
}

impl Entity for Projectile {
    type Context<'a> = ProjectileContext<'a>;
    type Snapshot = ProjectileSnapshot;

    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Point {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f64, ctx: ProjectileContext<'_>) {
        if !self.active {
            return;
        }

        self.advance(dt);

        if let Some(index) = self.first_hit(ctx.units) {
            let target = &mut ctx.units[index];
            let dealt = if ctx.untouchable.contains(&target.id()) {
                0.0
            } else {
                target.take_damage(self.damage, Some(self.source_unit), ctx.bus)
            };
            tracing::trace!(projectile = %self.id, target = %target.id(), dealt, "projectile hit");
            ctx.impacts.push(Impact {
                projectile: self.id,
                target: target.id(),
                position: self.position,
                dealt,
            });
            self.active = false;
            return;
        }

        if self.distance_traveled >= self.max_distance {
            self.active = false;
        }
    }

    fn serialize(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            radius: self.radius,
            damage: self.damage,
            source_team: self.source_team,
            source_unit: self.source_unit,
            max_distance: self.max_distance,
            distance_traveled: self.distance_traveled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSnapshot {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub damage: f64,
    pub source_team: Team,
    pub source_unit: EntityId,
    pub max_distance: f64,
    pub distance_traveled: f64,
}
