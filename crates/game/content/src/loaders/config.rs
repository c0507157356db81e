//! Battle configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{read_file, LoadResult};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.tick_rate == 0 {
            anyhow::bail!("tick_rate must be positive");
        }
        if config.checkpoint_interval_ticks == 0 {
            anyhow::bail!("checkpoint_interval_ticks must be positive");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse("round_seconds = 6.0\nhand_size = 3\n").expect("parses");
        assert_eq!(config.round_seconds, 6.0);
        assert_eq!(config.hand_size, 3);
        assert_eq!(config.tick_rate, BattleConfig::DEFAULT_TICK_RATE);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(ConfigLoader::parse("tick_rate = 0").is_err());
    }
}
