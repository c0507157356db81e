use std::env;
use std::time::Duration;

/// Tuning for one client's synchronization loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay between order-store polls while paused on a remote player.
    pub poll_interval: Duration,
    /// Rounds between the light round/time comparison.
    pub sync_check_rounds: u32,
    /// Local checkpoints kept for diffing against stored snapshots.
    pub history_depth: usize,
}

impl SessionConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_SYNC_CHECK_ROUNDS: u32 = 2;
    pub const DEFAULT_HISTORY_DEPTH: usize = 8;

    /// Defaults overridden by `BATTLE_POLL_INTERVAL_MS`,
    /// `BATTLE_SYNC_CHECK_ROUNDS` and `BATTLE_HISTORY_DEPTH`.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = read_env::<u64>("BATTLE_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(rounds) = read_env::<u32>("BATTLE_SYNC_CHECK_ROUNDS") {
            config.sync_check_rounds = rounds.max(1);
        }
        if let Some(depth) = read_env::<usize>("BATTLE_HISTORY_DEPTH") {
            config.history_depth = depth.max(1);
        }
        config
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth.max(1);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            sync_check_rounds: Self::DEFAULT_SYNC_CHECK_ROUNDS,
            history_depth: Self::DEFAULT_HISTORY_DEPTH,
        }
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.sync_check_rounds, 2);
        assert_eq!(config.history_depth, 8);
    }

    #[test]
    fn history_depth_is_at_least_one() {
        let config = SessionConfig::default().with_history_depth(0);
        assert_eq!(config.history_depth, 1);
    }
}
