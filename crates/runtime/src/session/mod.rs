//! Client-side driver for one player's view of a shared battle.
//!
//! A [`BattleSession`] owns its engine exclusively. It feeds frames into the
//! engine and talks to the store only at well-defined points:
//! - after a frame, to persist checkpoints (authority only) and poll for
//!   remote orders while paused on another player
//! - before a local order, to compare against the latest stored snapshot
//! - at every `sync_check_rounds`-th round end, to compare round and time

mod notify;
mod polling;
mod reconcile;

use std::collections::VecDeque;
use std::sync::Arc;

use battle_content::{BattleContent, CharacterSelection};
use battle_core::{BattleEngine, EngineOutput, Order, PlayerId, TimedOrder};
use tokio::sync::broadcast;

pub use notify::{OrderNotifier, OrdersReady};

use crate::clock::{Clock, PollSchedule};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::sync::{CheckpointHistory, LocalCheckpoint, state_hash};
use crate::transport::{BattleTransport, stored_snapshot};

/// Collaborators shared by every session of a battle.
#[derive(Clone)]
pub struct SessionContext {
    pub content: Arc<BattleContent>,
    pub transport: Arc<dyn BattleTransport>,
    pub clock: Arc<dyn Clock>,
    pub notifier: OrderNotifier,
    pub config: SessionConfig,
}

/// Who this client is and how a fresh battle is built.
#[derive(Clone, Debug)]
pub struct SessionParams {
    pub player: PlayerId,
    /// The authority persists checkpoints to the store.
    pub authority: bool,
    pub selections: Vec<CharacterSelection>,
    pub seed: u64,
}

pub struct BattleSession {
    params: SessionParams,
    ctx: SessionContext,
    engine: BattleEngine,
    history: CheckpointHistory,
    poll: PollSchedule,
    notices: broadcast::Receiver<OrdersReady>,
    /// Local orders not yet accepted by the store, with their bucket.
    outbox: VecDeque<(u64, TimedOrder)>,
    /// Outputs raised outside `frame`, returned by the next one.
    outputs: Vec<EngineOutput>,
    /// Tick of the pause whose pre-act check already ran.
    verified_tick: Option<u64>,
    needs_reconcile: bool,
    stopped: bool,
}

impl BattleSession {
    /// Joins the battle from the latest stored snapshot, or starts fresh from
    /// the character selections when none is usable, then replays the order
    /// log up to the live pause.
    pub async fn start(ctx: &SessionContext, params: SessionParams) -> Result<Self> {
        let stored = reconcile::load_latest_snapshot(ctx.transport.as_ref()).await;

        let restored = stored.and_then(|stored| match ctx.content.restore(&stored.state) {
            Ok(engine) => Some((engine, stored)),
            Err(error) => {
                tracing::warn!(%error, tick = stored.tick, "stored snapshot rejected; starting fresh");
                None
            }
        });

        let fresh = restored.is_none();
        let (engine, initial) = match restored {
            Some((engine, stored)) => (engine, stored),
            None => {
                let engine = ctx
                    .content
                    .new_battle(&params.selections, params.seed)
                    .map_err(|error| SessionError::Setup(format!("{error:#}")))?;
                let initial = stored_snapshot(&engine.serialize())?;
                (engine, initial)
            }
        };

        let mut session = Self {
            poll: PollSchedule::new(ctx.config.poll_interval),
            history: CheckpointHistory::new(ctx.config.history_depth),
            notices: ctx.notifier.subscribe(),
            ctx: ctx.clone(),
            params,
            engine,
            outbox: VecDeque::new(),
            outputs: Vec::new(),
            verified_tick: None,
            needs_reconcile: false,
            stopped: false,
        };

        if fresh && session.params.authority {
            if let Err(error) = session
                .ctx
                .transport
                .save_snapshot(initial.clone(), Vec::new())
                .await
            {
                tracing::error!(%error, "failed to store opening snapshot");
            }
        }
        session.history.push(LocalCheckpoint {
            tick: initial.tick,
            hash: initial.hash,
            state: Box::new(initial.state),
        });

        if let Err(error) = session.replay_log(0).await {
            tracing::warn!(%error, "order log unavailable; continuing from snapshot");
        }

        tracing::info!(
            player = %session.params.player,
            authority = session.params.authority,
            fresh,
            tick = session.engine.tick(),
            "session started"
        );
        Ok(session)
    }

    /// Feeds one frame of real time.
    ///
    /// Returns engine outputs raised since the previous frame, including
    /// those produced by polling or by submitting an order.
    pub async fn frame(&mut self, real_dt: f64) -> Result<Vec<EngineOutput>> {
        self.ensure_running()?;
        self.flush_outbox().await;

        let outputs = self.engine.advance(real_dt);
        self.observe(&outputs);
        self.publish(&outputs).await;

        self.rearm_poll();
        if self.drain_notices() || self.poll.is_due(self.ctx.clock.now()) {
            self.poll_orders().await;
        }

        Ok(std::mem::take(&mut self.outputs))
    }

    /// Applies a local order after the pre-act check, records it in the
    /// store and announces it.
    ///
    /// A failed store write is kept and retried on the following frames.
    pub async fn submit_order(&mut self, order: Order) -> Result<TimedOrder> {
        self.ensure_running()?;
        self.ensure_local_turn()?;

        if self.needs_reconcile || self.verified_tick != Some(self.engine.tick()) {
            self.prepare_local_turn().await?;
        }
        if self.needs_reconcile {
            return Err(SessionError::ReconcileRequired);
        }
        self.ensure_local_turn()?;

        let timed = self.engine.submit_order(order)?;
        let checkpoint = self.engine.config().checkpoint_for(timed.tick);
        self.outbox.push_back((checkpoint, timed.clone()));
        self.flush_outbox().await;

        let outputs = self.engine.take_outputs();
        self.observe(&outputs);
        self.publish(&outputs).await;
        Ok(timed)
    }

    /// Halts the session. Later calls fail with [`SessionError::Stopped`].
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.poll.disarm();
            tracing::info!(player = %self.params.player, tick = self.engine.tick(), "session stopped");
        }
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    pub fn player(&self) -> &PlayerId {
        &self.params.player
    }

    pub fn is_authority(&self) -> bool {
        self.params.authority
    }

    pub fn history(&self) -> &CheckpointHistory {
        &self.history
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn needs_reconcile(&self) -> bool {
        self.needs_reconcile
    }

    /// Local orders still waiting to reach the store.
    pub fn unsent_orders(&self) -> usize {
        self.outbox.len()
    }

    /// True when the engine is paused on a unit this player owns.
    pub fn is_local_turn(&self) -> bool {
        !self.engine.is_finished()
            && self
                .engine
                .waiting_for_orders()
                .is_some_and(|waiting| waiting.owner_id == self.params.player)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.stopped {
            Err(SessionError::Stopped)
        } else {
            Ok(())
        }
    }

    fn ensure_local_turn(&self) -> Result<()> {
        if self.is_local_turn() {
            Ok(())
        } else {
            Err(SessionError::NotLocalTurn {
                player: self.params.player.clone(),
                waiting: self.engine.waiting_for_orders().map(|waiting| waiting.unit_id),
            })
        }
    }

    /// Bookkeeping for outputs, including replayed ones: records checkpoints
    /// and tracks pauses.
    fn observe(&mut self, outputs: &[EngineOutput]) {
        for output in outputs {
            match output {
                EngineOutput::Checkpoint(checkpoint) => match state_hash(&checkpoint.state) {
                    Ok(hash) => {
                        tracing::debug!(tick = checkpoint.tick, %hash, "local checkpoint");
                        self.history.push(LocalCheckpoint {
                            tick: checkpoint.tick,
                            hash,
                            state: checkpoint.state.clone(),
                        });
                    }
                    Err(error) => {
                        tracing::warn!(%error, tick = checkpoint.tick, "checkpoint could not be hashed");
                    }
                },
                EngineOutput::AwaitingOrders(waiting) => {
                    self.verified_tick = None;
                    if waiting.owner_id == self.params.player {
                        self.poll.disarm();
                    } else {
                        self.poll.arm(self.ctx.clock.now());
                    }
                }
                EngineOutput::RoundEnded { .. } => {}
                EngineOutput::BattleEnded(outcome) => {
                    self.poll.disarm();
                    tracing::info!(
                        player = %self.params.player,
                        winner = ?outcome.winner,
                        tick = outcome.tick,
                        "battle finished"
                    );
                }
            }
        }
        self.outputs.extend_from_slice(outputs);
    }

    /// Store side effects of live outputs: checkpoint saves and round checks.
    async fn publish(&mut self, outputs: &[EngineOutput]) {
        for output in outputs {
            match output {
                EngineOutput::Checkpoint(checkpoint) if self.params.authority => {
                    self.save_checkpoint(checkpoint.tick, &checkpoint.state, &checkpoint.orders)
                        .await;
                }
                EngineOutput::RoundEnded { round } => {
                    let every = self.ctx.config.sync_check_rounds.max(1);
                    if round % every == 0 {
                        self.check_round_sync(*round).await;
                    }
                }
                _ => {}
            }
        }
    }

    /// Not retried: the next checkpoint carries a newer snapshot anyway.
    async fn save_checkpoint(
        &self,
        tick: u64,
        state: &battle_core::SerializedGameState,
        orders: &[TimedOrder],
    ) {
        let stored = match stored_snapshot(state) {
            Ok(stored) => stored,
            Err(error) => {
                tracing::error!(%error, tick, "checkpoint could not be encoded");
                return;
            }
        };
        match self.ctx.transport.save_snapshot(stored, orders.to_vec()).await {
            Ok(()) => tracing::debug!(tick, orders = orders.len(), "checkpoint stored"),
            Err(error) => tracing::error!(%error, tick, "checkpoint save failed"),
        }
    }
}
