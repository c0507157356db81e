//! Synchronous topic-based event bus.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::types::{BattleEvent, Topic};

type Listener = Rc<dyn Fn(&BattleEvent)>;

struct Registration {
    topic: Topic,
    listener: Listener,
}

#[derive(Default)]
struct Channels {
    next_id: u64,
    listeners: BTreeMap<u64, Registration>,
}

/// In-process publish/subscribe owned by one simulation.
///
/// `emit` invokes every listener registered for the event's topic before it
/// returns. Listeners are called in subscription order, but callers must not
/// depend on ordering across distinct listeners.
///
/// Listener lifetime is tied to the returned [`Subscription`]: dropping the
/// handle unsubscribes.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Rc<RefCell<Channels>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `topic`.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(
        &self,
        topic: Topic,
        listener: impl Fn(&BattleEvent) + 'static,
    ) -> Subscription {
        let mut channels = self.channels.borrow_mut();
        let id = channels.next_id;
        channels.next_id += 1;
        channels.listeners.insert(
            id,
            Registration {
                topic,
                listener: Rc::new(listener),
            },
        );

        Subscription {
            id,
            topic,
            channels: Rc::downgrade(&self.channels),
        }
    }

    /// Publishes `event` to every current subscriber of its topic.
    pub fn emit(&self, event: &BattleEvent) {
        let topic = event.topic();

        // Snapshot first so listeners may subscribe or unsubscribe re-entrantly.
        let listeners: Vec<Listener> = self
            .channels
            .borrow()
            .listeners
            .values()
            .filter(|registration| registration.topic == topic)
            .map(|registration| Rc::clone(&registration.listener))
            .collect();

        if listeners.is_empty() {
            tracing::trace!(?topic, "no subscribers for topic");
        }

        for listener in listeners {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels.borrow().listeners.len()
    }

    pub fn topic_subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .borrow()
            .listeners
            .values()
            .filter(|registration| registration.topic == topic)
            .count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Ownership-scoped subscription handle. Unsubscribes when dropped.
pub struct Subscription {
    id: u64,
    topic: Topic,
    channels: Weak<RefCell<Channels>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Explicitly releases the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channels) = self.channels.upgrade() {
            channels.borrow_mut().listeners.remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::state::EntityId;

    #[test]
    fn emit_reaches_only_matching_topic() {
        let bus = EventBus::new();
        let turns = Rc::new(Cell::new(0));
        let deaths = Rc::new(Cell::new(0));

        let turns_seen = Rc::clone(&turns);
        let _turn_sub = bus.subscribe(Topic::Turn, move |_| turns_seen.set(turns_seen.get() + 1));
        let deaths_seen = Rc::clone(&deaths);
        let _death_sub =
            bus.subscribe(Topic::Death, move |_| deaths_seen.set(deaths_seen.get() + 1));

        bus.emit(&BattleEvent::TurnEnded { unit: EntityId(1) });
        bus.emit(&BattleEvent::TurnEnded { unit: EntityId(2) });

        assert_eq!(turns.get(), 2);
        assert_eq!(deaths.get(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let sub = bus.subscribe(Topic::Turn, move |_| seen.set(seen.get() + 1));
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        bus.emit(&BattleEvent::TurnEnded { unit: EntityId(1) });

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.subscribe(Topic::Round, |_| {});
        drop(bus);
        sub.unsubscribe();
    }
}
