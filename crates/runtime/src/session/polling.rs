use tokio::sync::broadcast::error::TryRecvError;

use super::{BattleSession, OrdersReady};

/// Order exchange with the store while the battle waits on a player.
impl BattleSession {
    /// Writes queued local orders in order, stopping at the first failure.
    pub(super) async fn flush_outbox(&mut self) {
        while let Some((checkpoint, order)) = self.outbox.front().cloned() {
            let key = order.key();
            match self.ctx.transport.save_order(checkpoint, order).await {
                Ok(()) => {
                    self.outbox.pop_front();
                    tracing::debug!(%key, checkpoint, "order stored");
                    self.ctx.notifier.publish(OrdersReady {
                        from: self.params.player.clone(),
                        checkpoint,
                        key,
                    });
                }
                Err(error) => {
                    tracing::warn!(%error, %key, "order save failed; retrying next frame");
                    break;
                }
            }
        }
    }

    /// Empties the notification receiver. True when another player
    /// announced an order or notices were dropped.
    pub(super) fn drain_notices(&mut self) -> bool {
        let mut announced = false;
        loop {
            match self.notices.try_recv() {
                Ok(notice) => {
                    if notice.from != self.params.player {
                        tracing::trace!(from = %notice.from, key = %notice.key, "orders ready");
                        announced = true;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::trace!(missed, "order notices dropped");
                    announced = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        announced && self.is_remote_pause()
    }

    /// Keeps the poll schedule armed exactly while paused on a remote player.
    pub(super) fn rearm_poll(&mut self) {
        if self.is_remote_pause() {
            if !self.poll.is_armed() {
                self.poll.arm(self.ctx.clock.now());
            }
        } else {
            self.poll.disarm();
        }
    }

    /// Fetches the bucket containing the current tick and applies any orders
    /// for this pause. Failures are retried on the next interval.
    pub(super) async fn poll_orders(&mut self) {
        if !self.is_remote_pause() {
            return;
        }
        self.poll.record_poll(self.ctx.clock.now());

        let tick = self.engine.tick();
        let checkpoint = self.engine.config().checkpoint_for(tick);
        let batch = match self.ctx.transport.get_orders(checkpoint).await {
            Ok(batch) => batch,
            Err(error) => {
                tracing::trace!(%error, checkpoint, "order poll failed");
                return;
            }
        };

        let queued = self
            .engine
            .queue_orders(batch.orders.into_iter().filter(|order| order.tick >= tick));
        if queued == 0 {
            return;
        }
        let applied = self.engine.apply_pending_orders();
        tracing::debug!(queued, applied, tick, "applied remote orders");

        let outputs = self.engine.take_outputs();
        self.observe(&outputs);
        self.publish(&outputs).await;
    }

    fn is_remote_pause(&self) -> bool {
        !self.engine.is_finished()
            && self
                .engine
                .waiting_for_orders()
                .is_some_and(|waiting| waiting.owner_id != self.params.player)
    }
}
