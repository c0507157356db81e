use crate::ability::validate_targets;
use crate::entity::{ActiveAbility, Entity, Unit};
use crate::events::BattleEvent;
use crate::state::EntityId;

use super::{BattleEngine, EngineOutput, Order, OrderError, TimedOrder, WaitingForOrders};

/// Turn scheduling and order resolution for BattleEngine.
impl BattleEngine {
    /// Checks a locally submitted order without applying it.
    pub fn validate_order(&self, order: &Order) -> Result<(), OrderError> {
        if self.outcome.is_some() {
            return Err(OrderError::BattleFinished);
        }
        let waiting = self.waiting.as_ref().ok_or(OrderError::NotWaiting)?;
        if waiting.unit_id != order.unit_id {
            return Err(OrderError::WrongUnit {
                expected: waiting.unit_id,
                actual: order.unit_id,
            });
        }
        let unit = self
            .world
            .unit(order.unit_id)
            .ok_or(OrderError::UnitNotFound(order.unit_id))?;

        if let Some(path) = &order.move_path {
            if let Some(blocked) = path.iter().find(|p| !self.grid.is_point_passable(**p)) {
                return Err(OrderError::ImpassableWaypoint(*blocked));
            }
        }

        if order.is_wait() {
            return Ok(());
        }

        let descriptor = self
            .registry
            .descriptor(&order.ability_id)
            .ok_or_else(|| OrderError::UnknownAbility(order.ability_id.clone()))?;
        if !unit.knows(&order.ability_id) {
            return Err(OrderError::AbilityNotKnown {
                unit: unit.id(),
                ability: order.ability_id.clone(),
            });
        }
        if let Some(owner) = unit.owner() {
            if self.cards.has_player(owner) && !self.cards.has_in_hand(owner, &order.ability_id) {
                return Err(OrderError::CardNotInHand {
                    player: owner.clone(),
                    ability: order.ability_id.clone(),
                });
            }
        }
        if let Some(cost) = &descriptor.cost {
            if !unit.can_afford(cost) {
                return Err(OrderError::InsufficientResource {
                    unit: unit.id(),
                    ability: order.ability_id.clone(),
                });
            }
        }
        validate_targets(&descriptor.targets, &order.targets, &self.world.units)?;

        Ok(())
    }

    /// Validates and applies a local order. The returned record goes to the order log.
    pub fn submit_order(&mut self, order: Order) -> Result<TimedOrder, OrderError> {
        self.validate_order(&order)?;
        Ok(self.apply_order(order))
    }

    /// Applies an order received from another client.
    ///
    /// Only the pause is checked; ability, card and cost problems resolve
    /// the turn silently so a stale sender cannot deadlock the battle.
    pub fn apply_replayed_order(&mut self, timed: &TimedOrder) -> Result<(), OrderError> {
        if self.outcome.is_some() {
            return Err(OrderError::BattleFinished);
        }
        let waiting = self.waiting.as_ref().ok_or(OrderError::NotWaiting)?;
        if timed.tick != self.tick {
            return Err(OrderError::TickMismatch {
                expected: self.tick,
                actual: timed.tick,
            });
        }
        if waiting.unit_id != timed.order.unit_id {
            return Err(OrderError::WrongUnit {
                expected: waiting.unit_id,
                actual: timed.order.unit_id,
            });
        }

        let applied = self.apply_order(timed.order.clone());
        if applied.seq != timed.seq {
            tracing::warn!(
                expected = timed.seq,
                actual = applied.seq,
                tick = timed.tick,
                "replayed order sequence differs"
            );
        }
        Ok(())
    }

    /// Queues replayed orders. Orders at or before the last applied one and
    /// duplicates are ignored. Returns how many were queued.
    pub fn queue_orders(&mut self, orders: impl IntoIterator<Item = TimedOrder>) -> usize {
        let applied = self.last_order.as_ref().map(TimedOrder::key);
        let mut queued = 0;
        for order in orders {
            if applied.is_some_and(|key| order.key() <= key) {
                continue;
            }
            if self
                .pending_orders
                .iter()
                .any(|pending| pending.key() == order.key())
            {
                continue;
            }
            self.pending_orders.push(order);
            queued += 1;
        }
        self.pending_orders.sort_by_key(TimedOrder::key);
        queued
    }

    /// Applies queued orders for the current pause, in tick order.
    /// Returns how many were applied.
    pub fn apply_pending_orders(&mut self) -> usize {
        let mut applied = 0;
        while self.waiting.is_some() && self.outcome.is_none() {
            let Some(next) = self.pending_orders.first() else {
                break;
            };
            if next.tick > self.tick {
                break;
            }

            let timed = self.pending_orders.remove(0);
            if timed.tick < self.tick {
                tracing::warn!(order_tick = timed.tick, tick = self.tick, "dropping stale order");
                continue;
            }
            match self.apply_replayed_order(&timed) {
                Ok(()) => applied += 1,
                Err(error) => {
                    tracing::warn!(%error, key = %timed.key(), "dropping replayed order");
                }
            }
        }
        applied
    }

    /// Replays queued orders and fast-forwards to the next pause with nothing
    /// left to apply, or until `max_ticks` steps have run.
    pub fn catch_up(&mut self, max_ticks: u64) -> Vec<EngineOutput> {
        let start = self.tick;
        let mut outputs = Vec::new();
        loop {
            self.apply_pending_orders();
            outputs.append(&mut self.take_outputs());
            if self.outcome.is_some() || self.waiting.is_some() {
                break;
            }
            let budget = max_ticks.saturating_sub(self.tick - start);
            if budget == 0 {
                break;
            }
            outputs.extend(self.run_until_paused(budget));
        }
        outputs
    }

    /// Resolves the order, records it, and finds the next unit to wait on.
    fn apply_order(&mut self, order: Order) -> TimedOrder {
        let seq = match &self.last_order {
            Some(last) if last.tick == self.tick => last.seq + 1,
            _ => 0,
        };
        self.waiting = None;
        self.resolve_turn(&order);

        let timed = TimedOrder {
            tick: self.tick,
            seq,
            order,
        };
        tracing::debug!(
            key = %timed.key(),
            unit = %timed.order.unit_id,
            ability = %timed.order.ability_id,
            "order applied"
        );
        self.orders_since_checkpoint.push(timed.clone());
        self.last_order = Some(timed.clone());
        self.refresh_waiting();
        timed
    }

    /// Applies an order's effects to its unit and ends that unit's turn.
    pub(super) fn resolve_turn(&mut self, order: &Order) {
        let Some(index) = self.world.unit_index(order.unit_id) else {
            tracing::warn!(unit = %order.unit_id, "order for missing unit ignored");
            return;
        };
        let tick = self.tick;

        if let Some(path) = &order.move_path {
            let unit = &mut self.world.units[index];
            if path.is_empty() {
                unit.clear_movement();
            } else {
                unit.set_movement(path.clone(), None, tick);
            }
        }

        self.activate(index, order);

        self.world.bus.emit(&BattleEvent::TurnEnded {
            unit: order.unit_id,
        });
    }

    fn activate(&mut self, index: usize, order: &Order) {
        let wait_cooldown = self.config.wait_cooldown;
        let tick = self.tick;
        let unit = &mut self.world.units[index];

        if order.is_wait() {
            unit.start_cooldown(wait_cooldown);
            return;
        }

        let Some(ability) = self.registry.get(&order.ability_id) else {
            tracing::warn!(
                unit = %order.unit_id,
                ability = %order.ability_id,
                "unknown ability; resolving as no-op"
            );
            unit.start_cooldown(wait_cooldown);
            return;
        };
        let descriptor = ability.descriptor();

        if let Some(cost) = &descriptor.cost {
            if !unit.spend(cost) {
                tracing::warn!(
                    unit = %order.unit_id,
                    ability = %order.ability_id,
                    "cannot afford ability; turn resolved without effect"
                );
                unit.start_cooldown(wait_cooldown);
                return;
            }
        }

        unit.start_cooldown(descriptor.cooldown);
        unit.push_active_ability(ActiveAbility {
            ability: order.ability_id.clone(),
            activated_tick: tick,
            targets: order.targets.clone(),
        });
        let owner = unit.owner().cloned();

        self.world.bus.emit(&BattleEvent::AbilityUsed {
            unit: order.unit_id,
            ability: order.ability_id.clone(),
        });
        if let Some(owner) = owner {
            self.cards.exile_from_hand(&owner, &order.ability_id);
        }
    }

    /// Ready AI units act immediately, in iteration order.
    pub(super) fn run_ai_turns(&mut self) {
        let ready: Vec<EntityId> = self
            .world
            .units
            .iter()
            .filter(|unit| !unit.is_controllable() && unit.can_act())
            .map(Unit::id)
            .collect();

        for unit in ready {
            self.take_ai_turn(unit);
        }
    }

    /// Pauses on the first ready controllable unit, if not already paused.
    pub(super) fn refresh_waiting(&mut self) {
        if self.waiting.is_some() || self.outcome.is_some() {
            return;
        }
        let Some(unit) = self
            .world
            .units
            .iter()
            .find(|unit| unit.is_controllable() && unit.can_act())
        else {
            return;
        };
        let Some(owner) = unit.owner() else {
            return;
        };

        let waiting = WaitingForOrders {
            unit_id: unit.id(),
            owner_id: owner.clone(),
        };
        tracing::debug!(unit = %waiting.unit_id, owner = %waiting.owner_id, tick = self.tick, "awaiting orders");
        self.waiting = Some(waiting.clone());
        self.outputs.push(EngineOutput::AwaitingOrders(waiting));
    }
}
