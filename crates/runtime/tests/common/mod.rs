//! Shared fixtures: a two-player battle over one in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use battle_content::{BattleContent, CharacterSelection, ContentFactory};
use battle_core::{Order, PlayerId};
use battle_runtime::{
    BattleSession, InMemoryTransport, ManualClock, OrderNotifier, SessionConfig, SessionContext,
    SessionParams,
};

pub const DT: f64 = 1.0 / 60.0;
pub const CHECKPOINT_INTERVAL: u64 = 120;

pub struct Harness {
    pub ctx: SessionContext,
    pub transport: Arc<InMemoryTransport>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    let mut content = BattleContent::load(&ContentFactory::bundled(), "training_grounds")
        .expect("bundled content loads");
    content.config = content.config.clone().with_checkpoint_interval(CHECKPOINT_INTERVAL);

    let transport = Arc::new(InMemoryTransport::new(CHECKPOINT_INTERVAL));
    let clock = Arc::new(ManualClock::new());
    let ctx = SessionContext {
        content: Arc::new(content),
        transport: transport.clone(),
        clock: clock.clone(),
        notifier: OrderNotifier::default(),
        config: SessionConfig::default(),
    };
    Harness {
        ctx,
        transport,
        clock,
    }
}

/// A battle with only alice's knight on the player side.
pub fn solo_params() -> SessionParams {
    SessionParams {
        selections: vec![CharacterSelection::new("alice", "knight")],
        ..params("alice", true)
    }
}

pub fn params(player: &str, authority: bool) -> SessionParams {
    SessionParams {
        player: PlayerId::new(player),
        authority,
        selections: vec![
            CharacterSelection::new("alice", "knight"),
            CharacterSelection::new("bob", "mage"),
        ],
        seed: 42,
    }
}

pub async fn host_and_guest(harness: &Harness) -> (BattleSession, BattleSession) {
    let host = BattleSession::start(&harness.ctx, params("alice", true))
        .await
        .expect("host starts");
    let guest = BattleSession::start(&harness.ctx, params("bob", false))
        .await
        .expect("guest starts");
    (host, guest)
}

/// Answers a pause on this player's unit with `wait`.
pub async fn answer_local_turn(session: &mut BattleSession) {
    if session.is_local_turn() {
        let unit = session
            .engine()
            .waiting_for_orders()
            .expect("paused on a local unit")
            .unit_id;
        session
            .submit_order(Order::wait(unit))
            .await
            .expect("wait order accepted");
    }
}

pub async fn play_frame(session: &mut BattleSession) {
    session.frame(DT).await.expect("frame runs");
    answer_local_turn(session).await;
}

/// Alternates host and guest frames until `done` holds or `frames` run out.
///
/// `done` is checked after every frame, before local turns are answered, so
/// it can stop on a pause.
pub async fn play_until(
    host: &mut BattleSession,
    guest: &mut BattleSession,
    frames: usize,
    mut done: impl FnMut(&BattleSession, &BattleSession) -> bool,
) -> bool {
    if done(host, guest) {
        return true;
    }
    for _ in 0..frames {
        host.frame(DT).await.expect("host frame runs");
        if done(host, guest) {
            return true;
        }
        answer_local_turn(host).await;

        guest.frame(DT).await.expect("guest frame runs");
        if done(host, guest) {
            return true;
        }
        answer_local_turn(guest).await;
    }
    false
}

/// Ticks both histories hold, with whether the hashes agree.
pub fn shared_checkpoints(a: &BattleSession, b: &BattleSession) -> Vec<(u64, bool)> {
    a.history()
        .iter()
        .filter_map(|mine| {
            b.history()
                .get(mine.tick)
                .map(|theirs| (mine.tick, mine.hash == theirs.hash))
        })
        .collect()
}
