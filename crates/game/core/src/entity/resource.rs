use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::events::{BattleEvent, EventBus, Subscription, Topic};
use crate::state::EntityId;

/// Kind of per-unit meter, which decides the event it grows on.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Grows by `damage * gain` whenever the owner takes damage.
    Rage,
    /// Grows by `gain` whenever the owner ends a turn.
    Mana,
}

impl ResourceKind {
    pub fn topic(self) -> Topic {
        match self {
            ResourceKind::Rage => Topic::Damage,
            ResourceKind::Mana => Topic::Turn,
        }
    }
}

/// Template used to create a [`Resource`] at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub maximum: f64,
    pub gain: f64,
    #[serde(default)]
    pub starting: f64,
}

/// Serialized form of a resource meter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub kind: ResourceKind,
    pub current: f64,
    pub maximum: f64,
    pub gain: f64,
}

/// Event-driven meter attached to exactly one unit.
///
/// The bus listener shares the meter cell with the resource; the
/// [`Subscription`] is owned here, so dropping the resource (or the unit
/// holding it) unsubscribes.
pub struct Resource {
    kind: ResourceKind,
    meter: Rc<Cell<f64>>,
    maximum: f64,
    gain: f64,
    subscription: Option<Subscription>,
}

impl Resource {
    pub fn new(spec: ResourceSpec) -> Self {
        Self {
            kind: spec.kind,
            meter: Rc::new(Cell::new(spec.starting.clamp(0.0, spec.maximum))),
            maximum: spec.maximum,
            gain: spec.gain,
            subscription: None,
        }
    }

    pub fn from_snapshot(snapshot: &ResourceSnapshot) -> Self {
        Self {
            kind: snapshot.kind,
            meter: Rc::new(Cell::new(snapshot.current)),
            maximum: snapshot.maximum,
            gain: snapshot.gain,
            subscription: None,
        }
    }

    /// Subscribes to the owner's events. Re-attaching replaces the previous listener.
    pub fn attach(&mut self, owner: EntityId, bus: &EventBus) {
        let meter = Rc::clone(&self.meter);
        let maximum = self.maximum;
        let gain = self.gain;
        let kind = self.kind;

        let subscription = bus.subscribe(kind.topic(), move |event| {
            let growth = match (kind, event) {
                (ResourceKind::Rage, BattleEvent::DamageTaken { unit, amount, .. })
                    if *unit == owner =>
                {
                    amount * gain
                }
                (ResourceKind::Mana, BattleEvent::TurnEnded { unit }) if *unit == owner => gain,
                _ => return,
            };
            meter.set((meter.get() + growth).clamp(0.0, maximum));
        });

        self.subscription = Some(subscription);
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn current(&self) -> f64 {
        self.meter.get()
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.meter.get() + 1e-9 >= amount
    }

    /// Deducts `amount` if the meter holds enough. Returns whether it did.
    pub fn try_spend(&self, amount: f64) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.meter.set((self.meter.get() - amount).max(0.0));
        true
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            kind: self.kind,
            current: self.meter.get(),
            maximum: self.maximum,
            gain: self.gain,
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind)
            .field("current", &self.meter.get())
            .field("maximum", &self.maximum)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rage() -> Resource {
        Resource::new(ResourceSpec {
            kind: ResourceKind::Rage,
            maximum: 100.0,
            gain: 0.5,
            starting: 0.0,
        })
    }

    #[test]
    fn rage_grows_only_on_owner_damage() {
        let bus = EventBus::new();
        let mut resource = rage();
        resource.attach(EntityId(1), &bus);

        bus.emit(&BattleEvent::DamageTaken {
            unit: EntityId(1),
            amount: 20.0,
            source: None,
        });
        bus.emit(&BattleEvent::DamageTaken {
            unit: EntityId(2),
            amount: 50.0,
            source: None,
        });

        assert_eq!(resource.current(), 10.0);
    }

    #[test]
    fn mana_grows_on_turn_end_and_caps() {
        let bus = EventBus::new();
        let mut mana = Resource::new(ResourceSpec {
            kind: ResourceKind::Mana,
            maximum: 25.0,
            gain: 10.0,
            starting: 0.0,
        });
        mana.attach(EntityId(4), &bus);

        for _ in 0..5 {
            bus.emit(&BattleEvent::TurnEnded { unit: EntityId(4) });
        }

        assert_eq!(mana.current(), 25.0);
        assert!(mana.try_spend(20.0));
        assert!(!mana.try_spend(20.0));
    }

    #[test]
    fn drop_releases_subscription() {
        let bus = EventBus::new();
        let mut resource = rage();
        resource.attach(EntityId(1), &bus);
        assert_eq!(bus.topic_subscriber_count(Topic::Damage), 1);

        drop(resource);
        assert_eq!(bus.topic_subscriber_count(Topic::Damage), 0);
    }

    #[test]
    fn detach_stops_growth() {
        let bus = EventBus::new();
        let mut resource = rage();
        resource.attach(EntityId(1), &bus);
        resource.detach();

        bus.emit(&BattleEvent::DamageTaken {
            unit: EntityId(1),
            amount: 20.0,
            source: None,
        });
        assert_eq!(resource.current(), 0.0);
        assert!("mana".parse::<ResourceKind>().is_ok());
    }
}
