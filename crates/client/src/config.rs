//! Headless client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};
use battle_content::CharacterSelection;
use battle_runtime::SessionConfig;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Participants in join order; the first one is the authority.
    pub players: Vec<CharacterSelection>,
    pub arena: String,
    /// Content directory; the bundled data when `None`.
    pub data_dir: Option<PathBuf>,
    pub seed: u64,
    /// Stop after this much simulated time even if nobody has won.
    pub simulated_seconds: f64,
    /// Real seconds fed to each session per frame.
    pub frame_delta: f64,
    pub log_dir: PathBuf,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            players: vec![
                CharacterSelection::new("alice", "knight"),
                CharacterSelection::new("bob", "mage"),
            ],
            arena: "training_grounds".into(),
            data_dir: None,
            seed: 7,
            simulated_seconds: 60.0,
            frame_delta: 1.0 / 60.0,
            log_dir: PathBuf::from("logs"),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_PLAYERS` - `player:character` pairs, comma separated (default: `alice:knight,bob:mage`)
    /// - `BATTLE_ARENA` - arena file name without extension (default: `training_grounds`)
    /// - `BATTLE_DATA_DIR` - content directory (default: bundled data)
    /// - `BATTLE_SEED` - battle seed (default: 7)
    /// - `BATTLE_SECONDS` - simulated seconds to run (default: 60)
    /// - `BATTLE_FRAME_DELTA` - seconds per frame (default: 1/60)
    /// - `BATTLE_LOG_DIR` - log directory (default: `logs`)
    /// - plus the session variables read by [`SessionConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("BATTLE_PLAYERS") {
            config.players = parse_players(&raw)?;
        }
        if let Ok(arena) = env::var("BATTLE_ARENA") {
            config.arena = arena;
        }
        if let Some(dir) = env::var_os("BATTLE_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(seed) = read_env::<u64>("BATTLE_SEED") {
            config.seed = seed;
        }
        if let Some(seconds) = read_env::<f64>("BATTLE_SECONDS") {
            config.simulated_seconds = seconds.max(0.0);
        }
        if let Some(delta) = read_env::<f64>("BATTLE_FRAME_DELTA") {
            config.frame_delta = delta.max(0.001);
        }
        if let Some(dir) = env::var_os("BATTLE_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        config.session = SessionConfig::from_env();

        Ok(config)
    }
}

fn parse_players(raw: &str) -> Result<Vec<CharacterSelection>> {
    let mut players = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((player, character)) = entry.split_once(':') else {
            bail!("expected player:character, got {entry:?}");
        };
        players.push(CharacterSelection::new(player.trim(), character.trim()));
    }
    if players.is_empty() {
        bail!("BATTLE_PLAYERS names no players");
    }
    Ok(players)
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.trim().parse().ok()
}
