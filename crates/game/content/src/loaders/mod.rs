//! Content loaders for reading battle data from files.
//!
//! Each loader parses one RON/TOML file into battle-core types. Use
//! [`ContentFactory`] to load a whole data directory at once.

pub mod abilities;
pub mod arena;
pub mod config;
pub mod factory;
pub mod units;

pub use abilities::AbilityLoader;
pub use arena::{Arena, ArenaLoader, EnemyPlacement};
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use units::{UnitLoader, UnitTemplate};

use std::path::Path;

use anyhow::Context;

pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
