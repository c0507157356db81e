//! Headless battle client.
//!
//! Runs one session per configured player against a shared in-memory store,
//! with scripted players, to exercise the synchronization protocol end to
//! end. The first player is the authority that persists checkpoints.
//!
//! ```bash
//! BATTLE_PLAYERS=alice:knight,bob:mage,carol:ranger RUST_LOG=debug cargo run -p battle-client
//! ```

mod config;
mod logging;
mod pilot;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use battle_content::{BattleContent, ContentFactory};
use battle_core::GameError;
use battle_runtime::{
    BattleSession, InMemoryTransport, OrderNotifier, SessionContext, SessionParams, SystemClock,
};

use config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env()?;
    let _guard = logging::setup_logging(&config.log_dir)?;

    tracing::info!(
        players = config.players.len(),
        arena = %config.arena,
        seed = config.seed,
        "starting headless battle"
    );

    let factory = match &config.data_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    let content = BattleContent::load(&factory, &config.arena)
        .with_context(|| format!("loading arena {}", config.arena))?;
    let checkpoint_interval = content.config.checkpoint_interval_ticks;

    let ctx = SessionContext {
        content: Arc::new(content),
        transport: Arc::new(InMemoryTransport::new(checkpoint_interval)),
        clock: Arc::new(SystemClock::new()),
        notifier: OrderNotifier::default(),
        config: config.session.clone(),
    };

    let mut sessions = Vec::with_capacity(config.players.len());
    for (index, selection) in config.players.iter().enumerate() {
        let params = SessionParams {
            player: selection.player.clone(),
            authority: index == 0,
            selections: config.players.clone(),
            seed: config.seed,
        };
        let session = BattleSession::start(&ctx, params)
            .await
            .with_context(|| format!("starting session for {}", selection.player))?;
        sessions.push(session);
    }

    run(&config, &mut sessions).await?;

    for session in &mut sessions {
        let engine = session.engine();
        tracing::info!(
            player = %session.player(),
            tick = engine.tick(),
            round = engine.round(),
            outcome = ?engine.outcome(),
            alive = pilot::living_units(engine, session.player()).len(),
            "final state"
        );
        session.stop();
    }
    Ok(())
}

/// Frame loop shared by every session. Each local pause is answered by the
/// pilot right after the frame that raised it.
async fn run(config: &ClientConfig, sessions: &mut [BattleSession]) -> Result<()> {
    let mut frames = tokio::time::interval(Duration::from_secs_f64(config.frame_delta));

    loop {
        frames.tick().await;

        for session in sessions.iter_mut() {
            for output in session.frame(config.frame_delta).await? {
                tracing::trace!(player = %session.player(), ?output, "engine output");
            }
            if session.is_local_turn() {
                if let Some(order) = pilot::choose_order(session.engine()) {
                    match session.submit_order(order).await {
                        Ok(timed) => tracing::debug!(
                            player = %session.player(),
                            key = %timed.key(),
                            ability = %timed.order.ability_id,
                            "order submitted"
                        ),
                        Err(error) if error.severity().is_recoverable() => {
                            tracing::warn!(player = %session.player(), %error, "order deferred");
                        }
                        Err(error) => return Err(error.into()),
                    }
                }
            }
        }

        let done = sessions.iter().all(|session| {
            session.engine().is_finished() || session.engine().time() >= config.simulated_seconds
        });
        if done {
            return Ok(());
        }
    }
}
