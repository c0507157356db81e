use serde::{Deserialize, Serialize};

/// Battle configuration constants and tunable parameters.
///
/// Every client of a battle must use the same values; they feed directly into
/// the deterministic step function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Fixed simulation steps per simulated second.
    pub tick_rate: u32,
    /// A full checkpoint snapshot is taken every this many ticks.
    pub checkpoint_interval_ticks: u64,
    /// Length of a card round in simulated seconds.
    pub round_seconds: f64,
    /// Hand cap each player is replenished to at round end.
    pub hand_size: usize,
    /// Cooldown applied by the reserved `wait` order, in seconds.
    pub wait_cooldown: f64,
    /// Largest real-time delta a single frame callback may feed the accumulator.
    pub max_frame_delta: f64,
}

impl BattleConfig {
    pub const DEFAULT_TICK_RATE: u32 = 60;
    pub const DEFAULT_CHECKPOINT_INTERVAL_TICKS: u64 = 300;
    pub const DEFAULT_ROUND_SECONDS: f64 = 10.0;
    pub const DEFAULT_HAND_SIZE: usize = 4;
    pub const DEFAULT_WAIT_COOLDOWN: f64 = 1.0;
    pub const DEFAULT_MAX_FRAME_DELTA: f64 = 0.25;

    pub fn new() -> Self {
        Self {
            tick_rate: Self::DEFAULT_TICK_RATE,
            checkpoint_interval_ticks: Self::DEFAULT_CHECKPOINT_INTERVAL_TICKS,
            round_seconds: Self::DEFAULT_ROUND_SECONDS,
            hand_size: Self::DEFAULT_HAND_SIZE,
            wait_cooldown: Self::DEFAULT_WAIT_COOLDOWN,
            max_frame_delta: Self::DEFAULT_MAX_FRAME_DELTA,
        }
    }

    pub fn with_checkpoint_interval(mut self, ticks: u64) -> Self {
        self.checkpoint_interval_ticks = ticks.max(1);
        self
    }

    pub fn with_round_seconds(mut self, seconds: f64) -> Self {
        self.round_seconds = seconds;
        self
    }

    /// Duration of one fixed step in seconds.
    pub fn tick_duration(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }

    /// Simulated time at the end of `tick`.
    pub fn time_at(&self, tick: u64) -> f64 {
        tick as f64 / f64::from(self.tick_rate.max(1))
    }

    /// Checkpoint whose interval contains `tick`. The order log is keyed by this value.
    pub fn checkpoint_for(&self, tick: u64) -> u64 {
        let interval = self.checkpoint_interval_ticks.max(1);
        tick - tick % interval
    }

    pub fn is_checkpoint(&self, tick: u64) -> bool {
        tick % self.checkpoint_interval_ticks.max(1) == 0
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_keys_round_down() {
        let config = BattleConfig::default().with_checkpoint_interval(300);
        assert_eq!(config.checkpoint_for(0), 0);
        assert_eq!(config.checkpoint_for(299), 0);
        assert_eq!(config.checkpoint_for(300), 300);
        assert_eq!(config.checkpoint_for(601), 600);
        assert!(config.is_checkpoint(600));
        assert!(!config.is_checkpoint(601));
    }

    #[test]
    fn time_is_derived_from_ticks() {
        let config = BattleConfig::default();
        assert_eq!(config.time_at(120), 2.0);
    }
}
