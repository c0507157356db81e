mod common;

use battle_core::AbilityId;
use battle_runtime::{BattleSession, BattleTransport, StoredSnapshot, state_hash, stored_snapshot};

use common::{CHECKPOINT_INTERVAL, harness, host_and_guest, params, play_until, shared_checkpoints};

#[tokio::test]
async fn rejoining_guest_catches_up_with_the_host() {
    let harness = harness();
    let (mut host, mut guest) = host_and_guest(&harness).await;

    let first_leg = 3 * CHECKPOINT_INTERVAL;
    let reached = play_until(&mut host, &mut guest, 4_000, |host, guest| {
        host.engine().tick() >= first_leg && guest.engine().tick() >= first_leg
    })
    .await;
    assert!(reached);
    drop(guest);

    let mut rejoined = BattleSession::start(&harness.ctx, params("bob", false))
        .await
        .expect("guest rejoins");
    let joined_at = rejoined
        .history()
        .iter()
        .next()
        .map(|checkpoint| checkpoint.tick)
        .expect("restored snapshot recorded");
    assert!(joined_at >= CHECKPOINT_INTERVAL, "rejoined from tick {joined_at}");

    let second_leg = first_leg + 3 * CHECKPOINT_INTERVAL;
    let reached = play_until(&mut host, &mut rejoined, 4_000, |host, guest| {
        (host.engine().tick() >= second_leg && guest.engine().tick() >= second_leg)
            || (host.engine().is_finished() && guest.engine().is_finished())
    })
    .await;
    assert!(reached);

    let shared = shared_checkpoints(&host, &rejoined);
    assert!(shared.iter().any(|(tick, _)| *tick > joined_at));
    for (tick, agrees) in shared {
        assert!(agrees, "checkpoint {tick} differs after rejoin");
    }
}

#[tokio::test]
async fn missing_snapshot_starts_a_fresh_battle() {
    let harness = harness();
    let guest = BattleSession::start(&harness.ctx, params("bob", false))
        .await
        .expect("guest starts without a snapshot");

    assert_eq!(guest.engine().tick(), 0);
    // Two players plus the arena's three enemies.
    assert_eq!(guest.engine().units().len(), 5);
    assert!(harness.transport.snapshot_ticks().unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_with_a_wrong_digest_is_ignored() {
    let harness = harness();
    let engine = harness
        .ctx
        .content
        .new_battle(&params("alice", true).selections, 42)
        .unwrap();
    let mut state = engine.serialize();
    state.game_tick = 600;
    state.game_time = 10.0;
    harness
        .transport
        .save_snapshot(
            StoredSnapshot {
                tick: 600,
                hash: "0".repeat(64),
                state,
            },
            Vec::new(),
        )
        .await
        .unwrap();

    let guest = BattleSession::start(&harness.ctx, params("bob", false))
        .await
        .expect("guest starts fresh");

    let fresh_hash = state_hash(&engine.serialize()).expect("fresh state hashes");
    let opening = guest.history().get(0).expect("fresh opening checkpoint");
    assert_eq!(opening.hash, fresh_hash);
    assert!(guest.history().get(600).is_none());
    assert!(guest.engine().tick() < 600);
    assert!(
        guest
            .engine()
            .units()
            .iter()
            .all(|unit| unit.hp() == unit.max_hp())
    );
}

#[tokio::test]
async fn unrestorable_snapshot_falls_back_to_selections() {
    let harness = harness();
    let engine = harness
        .ctx
        .content
        .new_battle(&params("alice", true).selections, 42)
        .unwrap();
    let mut state = engine.serialize();
    state.units[0].abilities.push(AbilityId::new("meteor"));
    harness
        .transport
        .save_snapshot(stored_snapshot(&state).unwrap(), Vec::new())
        .await
        .unwrap();

    let guest = BattleSession::start(&harness.ctx, params("bob", false))
        .await
        .expect("guest starts fresh");
    assert_eq!(guest.engine().tick(), 0);
    assert!(
        guest.engine().units()[0]
            .abilities()
            .iter()
            .all(|ability| ability.as_str() != "meteor")
    );
}
