//! Data-driven battle content and loaders.
//!
//! This crate houses the static content a battle is built from and provides
//! loaders for the RON/TOML data files:
//! - Ability catalog with time-phased effect variants (RON)
//! - Player character and enemy templates (RON)
//! - Arena terrain and spawn layouts (RON)
//! - Battle configuration (TOML)
//!
//! Content is consumed when a battle is created or restored and never appears
//! in the serialized game state beyond ids.

pub mod abilities;
pub mod loaders;
pub mod setup;

pub use abilities::{AbilityEffect, ContentAbility};
pub use loaders::{
    AbilityLoader, Arena, ArenaLoader, ConfigLoader, ContentFactory, EnemyPlacement, UnitLoader,
    UnitTemplate,
};
pub use setup::{BattleContent, CharacterSelection};
