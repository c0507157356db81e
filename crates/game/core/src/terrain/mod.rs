//! Terrain grid and A* pathfinding.
//!
//! Only the gameplay side of terrain lives here: passability, movement speed
//! and path cost. The grid is static for the lifetime of a battle and is not
//! part of the serialized state.

mod grid;
mod pathfinder;

pub use grid::{Cell, GridError, TerrainGrid};
pub use pathfinder::Pathfinder;

use serde::{Deserialize, Serialize};

/// Terrain type of a single grid cell.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    #[default]
    Grass,
    Road,
    Sand,
    Mud,
    ShallowWater,
    Rock,
    DeepWater,
}

impl TerrainKind {
    pub fn is_passable(self) -> bool {
        !matches!(self, TerrainKind::Rock | TerrainKind::DeepWater)
    }

    /// Multiplier applied to a unit's speed while standing on this terrain.
    pub fn speed_multiplier(self) -> f64 {
        match self {
            TerrainKind::Road => 1.0,
            TerrainKind::Grass => 0.9,
            TerrainKind::Sand => 0.75,
            TerrainKind::Mud => 0.5,
            TerrainKind::ShallowWater => 0.4,
            // Impassable; units never stand here.
            TerrainKind::Rock | TerrainKind::DeepWater => 1.0,
        }
    }

    /// Pathfinding cost of entering a cell of this terrain. Always `>= 1`.
    pub fn path_weight(self) -> f64 {
        match self {
            TerrainKind::Road => 1.0,
            TerrainKind::Grass => 1.2,
            TerrainKind::Sand => 1.5,
            TerrainKind::Mud => 2.5,
            TerrainKind::ShallowWater => 3.0,
            TerrainKind::Rock | TerrainKind::DeepWater => f64::INFINITY,
        }
    }

    /// Single-character map notation used by arena files.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            '.' | 'g' => TerrainKind::Grass,
            '=' | 'r' => TerrainKind::Road,
            's' => TerrainKind::Sand,
            'm' => TerrainKind::Mud,
            '~' | 'w' => TerrainKind::ShallowWater,
            '#' => TerrainKind::Rock,
            'W' => TerrainKind::DeepWater,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passable_terrain_has_finite_weight() {
        for kind in [
            TerrainKind::Grass,
            TerrainKind::Road,
            TerrainKind::Sand,
            TerrainKind::Mud,
            TerrainKind::ShallowWater,
        ] {
            assert!(kind.is_passable());
            assert!(kind.path_weight() >= 1.0 && kind.path_weight().is_finite());
        }
        assert!(!TerrainKind::Rock.is_passable());
        assert_eq!(
            "shallow_water".parse::<TerrainKind>().ok(),
            Some(TerrainKind::ShallowWater)
        );
    }
}
