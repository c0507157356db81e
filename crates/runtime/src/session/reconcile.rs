//! Desync detection and recovery.
//!
//! A diverged client discards its engine, restores the authoritative
//! snapshot and replays the order log forward to the live pause.

use battle_core::EngineOutput;

use super::BattleSession;
use crate::error::{Result, TransportError};
use crate::sync::{LocalCheckpoint, SyncReport, diff_states, state_hash};
use crate::transport::{BattleTransport, StoredSnapshot};

/// Tolerance for comparing elapsed game time between clients.
const TIME_EPSILON: f64 = 1e-9;

/// Latest stored snapshot whose digest matches its contents.
pub(super) async fn load_latest_snapshot(transport: &dyn BattleTransport) -> Option<StoredSnapshot> {
    let stored = match transport.get_snapshot(None).await {
        Ok(Some(stored)) => stored,
        Ok(None) => return None,
        Err(error) => {
            tracing::warn!(%error, "snapshot fetch failed");
            return None;
        }
    };
    match state_hash(&stored.state) {
        Ok(hash) if hash == stored.hash => Some(stored),
        Ok(hash) => {
            tracing::warn!(tick = stored.tick, stored = %stored.hash, computed = %hash, "corrupt snapshot");
            None
        }
        Err(error) => {
            tracing::warn!(%error, tick = stored.tick, "snapshot could not be encoded");
            None
        }
    }
}

impl BattleSession {
    /// Compares the latest stored snapshot with the local checkpoint at the
    /// same tick and reloads when any field differs.
    ///
    /// A transport failure leaves the local state unverified unless an
    /// earlier check already demanded a reload.
    pub async fn prepare_local_turn(&mut self) -> Result<SyncReport> {
        self.ensure_running()?;

        let stored = match self.ctx.transport.get_snapshot(None).await {
            Ok(stored) => stored,
            Err(error) if self.needs_reconcile => return Err(error.into()),
            Err(error) => {
                tracing::warn!(%error, "pre-act check skipped");
                return Ok(self.verified(SyncReport::Unverified {
                    reason: error.to_string(),
                }));
            }
        };
        let Some(stored) = stored else {
            return Ok(self.verified(SyncReport::Unverified {
                reason: "no snapshot stored".into(),
            }));
        };

        let paths = if stored.tick > self.engine.tick() {
            Some(diff_states(&self.engine.serialize(), &stored.state).map_err(TransportError::from)?)
        } else {
            match self.history.get(stored.tick) {
                Some(local) if local.hash == stored.hash => Some(Vec::new()),
                Some(local) => {
                    Some(diff_states(&local.state, &stored.state).map_err(TransportError::from)?)
                }
                None if self.needs_reconcile => Some(vec!["gameTick".to_owned()]),
                None => None,
            }
        };
        let Some(paths) = paths else {
            return Ok(self.verified(SyncReport::Unverified {
                reason: format!("no local checkpoint at tick {}", stored.tick),
            }));
        };

        if paths.is_empty() && !self.needs_reconcile {
            return Ok(self.verified(SyncReport::InSync { tick: stored.tick }));
        }

        tracing::warn!(
            player = %self.params.player,
            tick = stored.tick,
            ?paths,
            "state diverged from stored snapshot; reloading"
        );
        let tick = stored.tick;
        self.reload_from(stored).await?;
        Ok(self.verified(SyncReport::Reloaded { tick, paths }))
    }

    /// Light check run at round ends: only round number and game time.
    pub(super) async fn check_round_sync(&mut self, round: u32) {
        let stored = match self.ctx.transport.get_snapshot(None).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(error) => {
                tracing::debug!(%error, round, "round sync check skipped");
                return;
            }
        };
        let Some(local) = self.history.get(stored.tick) else {
            tracing::trace!(round, tick = stored.tick, "no local checkpoint for round sync check");
            return;
        };

        let local_round = local.state.round_number;
        let local_time = local.state.game_time;
        if local_round == stored.state.round_number
            && (local_time - stored.state.game_time).abs() <= TIME_EPSILON
        {
            tracing::trace!(round, tick = stored.tick, "round sync ok");
            return;
        }

        tracing::warn!(
            round,
            tick = stored.tick,
            local_round,
            stored_round = stored.state.round_number,
            local_time,
            stored_time = stored.state.game_time,
            "round sync mismatch; reloading"
        );
        self.needs_reconcile = true;
        if let Err(error) = self.reload_from(stored).await {
            tracing::warn!(%error, "reload failed; next local turn retries");
        }
    }

    /// Replaces the engine with `stored` and replays the log forward.
    async fn reload_from(&mut self, stored: StoredSnapshot) -> Result<()> {
        self.needs_reconcile = true;
        let live_tick = self.engine.tick();
        let engine = self.ctx.content.restore(&stored.state)?;

        self.engine = engine;
        self.history.clear();
        self.history.push(LocalCheckpoint {
            tick: stored.tick,
            hash: stored.hash,
            state: Box::new(stored.state),
        });
        self.poll.disarm();

        // Unsent local orders will still reach the store; replay them too.
        let unsent: Vec<_> = self.outbox.iter().map(|(_, order)| order.clone()).collect();
        self.engine.queue_orders(unsent);

        self.replay_log(live_tick).await?;
        self.needs_reconcile = false;
        self.rearm_poll();
        Ok(())
    }

    /// Queues every logged order from the current checkpoint bucket onward
    /// and fast-forwards to the newest tick the store knows of, or to
    /// `live_tick` if that is later. Stops early at a pause nothing has
    /// answered yet.
    pub(super) async fn replay_log(&mut self, live_tick: u64) -> Result<Vec<EngineOutput>> {
        let config = self.engine.config().clone();
        let interval = config.checkpoint_interval_ticks.max(1);
        let start = self.engine.tick();

        let mut checkpoint = config.checkpoint_for(start);
        let mut head = start.max(live_tick);
        loop {
            let batch = self.ctx.transport.get_orders(checkpoint).await?;
            head = head.max(batch.tick);
            self.engine
                .queue_orders(batch.orders.into_iter().filter(|order| order.tick >= start));
            checkpoint += interval;
            if checkpoint > head {
                break;
            }
        }

        let outputs = self.engine.catch_up(head.saturating_sub(start));
        tracing::info!(
            player = %self.params.player,
            from = start,
            to = self.engine.tick(),
            head,
            "replayed order log"
        );
        self.observe(&outputs);
        Ok(outputs)
    }

    fn verified(&mut self, report: SyncReport) -> SyncReport {
        self.verified_tick = Some(self.engine.tick());
        report
    }
}
