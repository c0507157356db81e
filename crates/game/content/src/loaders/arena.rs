//! Arena loader.
//!
//! Arena files hold the terrain rows in single-character notation plus the
//! spawn layout. Only gameplay terrain is described here.

use std::path::Path;

use battle_core::{Point, TerrainGrid, TerrainKind};
use serde::{Deserialize, Serialize};

use crate::loaders::{read_file, LoadResult};

/// Arena data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArenaRon {
    name: String,
    cell_size: f64,
    rows: Vec<String>,
    player_spawns: Vec<(f64, f64)>,
    #[serde(default)]
    enemies: Vec<EnemyPlacement>,
}

/// An enemy placed by the arena at battle start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    pub template: String,
    pub x: f64,
    pub y: f64,
}

impl EnemyPlacement {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A parsed arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    pub name: String,
    pub grid: TerrainGrid,
    /// Player units spawn here in selection order.
    pub player_spawns: Vec<Point>,
    pub enemies: Vec<EnemyPlacement>,
}

/// Loader for arena files (`arenas/{name}.ron`).
pub struct ArenaLoader;

impl ArenaLoader {
    pub fn load(path: &Path) -> LoadResult<Arena> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Arena> {
        let data: ArenaRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse arena RON: {}", e))?;

        let mut rows = Vec::with_capacity(data.rows.len());
        for (y, row) in data.rows.iter().enumerate() {
            let cells = row
                .chars()
                .enumerate()
                .map(|(x, symbol)| {
                    TerrainKind::from_symbol(symbol).ok_or_else(|| {
                        anyhow::anyhow!("unknown terrain symbol '{}' at ({}, {})", symbol, x, y)
                    })
                })
                .collect::<LoadResult<Vec<_>>>()?;
            rows.push(cells);
        }
        let grid = TerrainGrid::from_rows(data.cell_size, rows)?;

        let player_spawns: Vec<Point> = data
            .player_spawns
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect();
        let blocked = player_spawns
            .iter()
            .copied()
            .chain(data.enemies.iter().map(EnemyPlacement::position))
            .find(|point| !grid.is_point_passable(*point));
        if let Some(point) = blocked {
            anyhow::bail!("arena '{}' spawns a unit on impassable ground at {}", data.name, point);
        }

        Ok(Arena {
            name: data.name,
            grid,
            player_spawns,
            enemies: data.enemies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_spawns() {
        let arena = ArenaLoader::parse(
            r#"(name: "pit", cell_size: 32.0, rows: ["..#", "~=W"],
                player_spawns: [(16.0, 16.0)],
                enemies: [(template: "goblin", x: 48.0, y: 48.0)])"#,
        )
        .expect("parses");

        assert_eq!((arena.grid.width(), arena.grid.height()), (3, 2));
        assert!(!arena.grid.is_point_passable(Point::new(80.0, 16.0)));
        assert_eq!(arena.enemies[0].position(), Point::new(48.0, 48.0));
    }

    #[test]
    fn spawn_on_rock_is_rejected() {
        let err = ArenaLoader::parse(
            r##"(name: "pit", cell_size: 32.0, rows: ["#."], player_spawns: [(16.0, 16.0)])"##,
        );
        assert!(err.is_err());
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let err = ArenaLoader::parse(
            r#"(name: "pit", cell_size: 32.0, rows: [".?"], player_spawns: [])"#,
        );
        assert!(err.unwrap_err().to_string().contains("'?'"));
    }
}
