mod common;

use battle_core::Order;
use battle_runtime::{BattleSession, BattleTransport, SessionError, SyncReport, stored_snapshot};

use common::{
    CHECKPOINT_INTERVAL, DT, harness, host_and_guest, play_frame, play_until, shared_checkpoints,
    solo_params,
};

fn owner_of_pause(session: &BattleSession) -> Option<&str> {
    session
        .engine()
        .waiting_for_orders()
        .map(|waiting| waiting.owner_id.0.as_str())
}

// The manual clock never moves in these tests, so after the first poll of
// each pause only "orders ready" notices make sessions poll again.
#[tokio::test]
async fn host_and_guest_agree_at_every_checkpoint() {
    let harness = harness();
    let (mut host, mut guest) = host_and_guest(&harness).await;

    let target = 4 * CHECKPOINT_INTERVAL;
    let reached = play_until(&mut host, &mut guest, 4_000, |host, guest| {
        (host.engine().tick() >= target && guest.engine().tick() >= target)
            || (host.engine().is_finished() && guest.engine().is_finished())
    })
    .await;
    assert!(reached, "battle stalled at tick {}", host.engine().tick());

    let shared = shared_checkpoints(&host, &guest);
    assert!(shared.iter().any(|(tick, _)| *tick > 0), "no shared checkpoint");
    for (tick, agrees) in shared {
        assert!(agrees, "checkpoint {tick} differs");
    }

    let stored = harness.transport.snapshot_ticks().unwrap();
    assert!(stored.contains(&0));
    assert!(stored.contains(&CHECKPOINT_INTERVAL));
    assert!(harness.transport.order_count().unwrap() > 0);
}

#[tokio::test]
async fn tampered_snapshot_reports_the_changed_path_and_reloads() {
    let harness = harness();
    let (mut host, mut guest) = host_and_guest(&harness).await;

    let transport = harness.transport.clone();
    let ready = play_until(&mut host, &mut guest, 4_000, |_, guest| {
        guest.is_local_turn()
            && transport
                .snapshot_ticks()
                .unwrap()
                .iter()
                .any(|tick| *tick > 0 && guest.history().get(*tick).is_some())
    })
    .await;
    assert!(ready, "guest never reached a verifiable turn");

    let mut stored = harness.transport.get_snapshot(None).await.unwrap().unwrap();
    assert!(guest.history().get(stored.tick).is_some());
    stored.state.units[0].hp -= 1.0;
    let tampered = stored_snapshot(&stored.state).unwrap();
    harness.transport.save_snapshot(tampered, Vec::new()).await.unwrap();

    let pause_tick = guest.engine().tick();
    let report = guest.prepare_local_turn().await.unwrap();
    assert_eq!(
        report,
        SyncReport::Reloaded {
            tick: stored.tick,
            paths: vec!["units[0].hp".to_owned()],
        }
    );
    assert_eq!(guest.engine().tick(), pause_tick);
    assert!(guest.is_local_turn());
    assert!(!guest.needs_reconcile());

    let unit = guest.engine().waiting_for_orders().unwrap().unit_id;
    guest.submit_order(Order::wait(unit)).await.unwrap();
}

#[tokio::test]
async fn matching_snapshot_keeps_local_state() {
    let harness = harness();
    let (mut host, mut guest) = host_and_guest(&harness).await;

    let ready = play_until(&mut host, &mut guest, 2_000, |_, guest| guest.is_local_turn()).await;
    assert!(ready);

    let before = guest.engine().serialize();
    let report = guest.prepare_local_turn().await.unwrap();
    assert!(
        matches!(report, SyncReport::InSync { .. }),
        "unexpected report {report:?}"
    );
    assert_eq!(guest.engine().serialize(), before);
}

#[tokio::test]
async fn orders_are_rejected_outside_the_local_turn() {
    let harness = harness();
    let (mut host, mut guest) = host_and_guest(&harness).await;

    let ready = play_until(&mut host, &mut guest, 2_000, |host, _| {
        owner_of_pause(host) == Some("bob")
    })
    .await;
    assert!(ready);

    let unit = host.engine().waiting_for_orders().unwrap().unit_id;
    let error = host.submit_order(Order::wait(unit)).await.unwrap_err();
    assert!(matches!(error, SessionError::NotLocalTurn { .. }));
}

#[tokio::test]
async fn checkpoint_save_failure_does_not_stop_the_battle() {
    let harness = harness();
    let mut host = BattleSession::start(&harness.ctx, solo_params())
        .await
        .expect("host starts");

    harness.transport.set_offline(true);
    while host.engine().tick() < CHECKPOINT_INTERVAL + 10 && !host.engine().is_finished() {
        play_frame(&mut host).await;
    }
    assert!(host.unsent_orders() > 0, "orders are held while offline");

    harness.transport.set_offline(false);
    while host.engine().tick() < 2 * CHECKPOINT_INTERVAL + 10 && !host.engine().is_finished() {
        play_frame(&mut host).await;
    }

    assert_eq!(host.unsent_orders(), 0);
    assert!(harness.transport.order_count().unwrap() > 0);
    assert_eq!(
        harness.transport.snapshot_ticks().unwrap(),
        vec![0, 2 * CHECKPOINT_INTERVAL]
    );
}

#[tokio::test]
async fn stopped_session_refuses_frames() {
    let harness = harness();
    let (mut host, _guest) = host_and_guest(&harness).await;

    play_frame(&mut host).await;
    host.stop();
    assert!(host.is_stopped());
    assert!(matches!(host.frame(DT).await, Err(SessionError::Stopped)));
}
