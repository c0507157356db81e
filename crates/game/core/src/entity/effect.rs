use serde::{Deserialize, Serialize};

use super::Entity;
use crate::state::{EntityId, Point};

/// Timed marker for renderers. Has no gameplay effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    id: EntityId,
    kind: String,
    position: Point,
    duration: f64,
    elapsed: f64,
    active: bool,
}

impl Effect {
    pub fn new(id: EntityId, kind: impl Into<String>, position: Point, duration: f64) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            duration,
            elapsed: 0.0,
            active: duration > 0.0,
        }
    }

    pub fn from_snapshot(snapshot: &EffectSnapshot) -> Self {
        Self {
            id: snapshot.id,
            kind: snapshot.effect_type.clone(),
            position: Point::new(snapshot.x, snapshot.y),
            duration: snapshot.duration,
            elapsed: snapshot.elapsed,
            active: true,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Fraction of the duration elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

impl Entity for Effect {
    type Context<'a> = ();
    type Snapshot = EffectSnapshot;

    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Point {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, dt: f64, _ctx: ()) {
        if !self.active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration - 1e-9 {
            self.elapsed = self.duration;
            self.active = false;
        }
    }

    fn serialize(&self) -> EffectSnapshot {
        EffectSnapshot {
            id: self.id,
            effect_type: self.kind.clone(),
            x: self.position.x,
            y: self.position.y,
            duration: self.duration,
            elapsed: self.elapsed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectSnapshot {
    pub id: EntityId,
    pub effect_type: String,
    pub x: f64,
    pub y: f64,
    pub duration: f64,
    pub elapsed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_at_duration() {
        let mut effect = Effect::new(EntityId(1), "impact", Point::ORIGIN, 0.25);
        for _ in 0..14 {
            effect.update(1.0 / 60.0, ());
        }
        assert!(effect.is_active());
        assert!(effect.progress() > 0.9);

        effect.update(1.0 / 60.0, ());
        assert!(!effect.is_active());
        assert_eq!(effect.progress(), 1.0);
    }
}
