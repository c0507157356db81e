//! Content factory for loading a whole data directory.

use std::path::{Path, PathBuf};

use battle_core::{AbilityRegistry, BattleConfig};

use crate::loaders::{
    AbilityLoader, Arena, ArenaLoader, ConfigLoader, LoadResult, UnitLoader, UnitTemplate,
};

/// Content factory that loads battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml
/// ├── abilities.ron
/// ├── characters.ron
/// ├── enemies.ron
/// └── arenas/
///     └── training_grounds.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
    }

    /// Load battle configuration from `battle.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("battle.toml"))
    }

    /// Load `abilities.ron` into a registry.
    pub fn load_registry(&self) -> LoadResult<AbilityRegistry> {
        let abilities = AbilityLoader::load(&self.data_dir.join("abilities.ron"))?;
        AbilityLoader::build_registry(abilities)
    }

    /// Load player character templates from `characters.ron`.
    pub fn load_characters(&self) -> LoadResult<Vec<UnitTemplate>> {
        UnitLoader::load(&self.data_dir.join("characters.ron"))
    }

    /// Load enemy templates from `enemies.ron`.
    pub fn load_enemies(&self) -> LoadResult<Vec<UnitTemplate>> {
        UnitLoader::load(&self.data_dir.join("enemies.ron"))
    }

    /// Load an arena from `arenas/{arena_name}.ron`.
    pub fn load_arena(&self, arena_name: &str) -> LoadResult<Arena> {
        let path = self
            .data_dir
            .join("arenas")
            .join(format!("{}.ron", arena_name));
        ArenaLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
