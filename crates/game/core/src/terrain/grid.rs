use std::fmt;

use super::TerrainKind;
use crate::state::Point;

/// Integer grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("grid must have at least one row and one column")]
    Empty,

    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f64),
}

/// Rectangular terrain map in world space, `cell_size` pixels per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    cell_size: f64,
    cells: Vec<TerrainKind>,
}

impl TerrainGrid {
    pub fn new(width: u32, height: u32, cell_size: f64, fill: TerrainKind) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![fill; width as usize * height as usize],
        }
    }

    /// Builds a grid from rows, top row first.
    pub fn from_rows(cell_size: f64, rows: Vec<Vec<TerrainKind>>) -> Result<Self, GridError> {
        if cell_size.is_nan() || cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(GridError::Empty);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    actual: cells.len(),
                });
            }
        }

        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            cell_size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World-space size in pixels.
    pub fn bounds(&self) -> Point {
        Point::new(
            f64::from(self.width) * self.cell_size,
            f64::from(self.height) * self.cell_size,
        )
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn index(&self, cell: Cell) -> usize {
        cell.y as usize * self.width as usize + cell.x as usize
    }

    pub(crate) fn cell_from_index(&self, index: usize) -> Cell {
        let width = self.width as usize;
        Cell::new((index % width) as u32, (index / width) as u32)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn terrain(&self, cell: Cell) -> Option<TerrainKind> {
        self.contains(cell).then(|| self.cells[self.index(cell)])
    }

    pub fn set(&mut self, cell: Cell, kind: TerrainKind) {
        if self.contains(cell) {
            let index = self.index(cell);
            self.cells[index] = kind;
        }
    }

    pub fn is_passable(&self, cell: Cell) -> bool {
        self.terrain(cell).is_some_and(TerrainKind::is_passable)
    }

    /// Cell containing `point`, or `None` outside the grid.
    pub fn cell_at(&self, point: Point) -> Option<Cell> {
        if point.x < 0.0 || point.y < 0.0 || point.x.is_nan() || point.y.is_nan() {
            return None;
        }
        let x = (point.x / self.cell_size).floor();
        let y = (point.y / self.cell_size).floor();
        if x >= f64::from(self.width) || y >= f64::from(self.height) {
            return None;
        }
        Some(Cell::new(x as u32, y as u32))
    }

    /// Cell containing `point`, clamped onto the grid edge.
    pub fn clamp_cell(&self, point: Point) -> Cell {
        let clamp = |value: f64, cells: u32| {
            let max = cells.saturating_sub(1);
            let index = (value / self.cell_size).floor();
            if index.is_nan() || index <= 0.0 {
                0
            } else {
                (index as u32).min(max)
            }
        };
        Cell::new(clamp(point.x, self.width), clamp(point.y, self.height))
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        Point::new(
            (f64::from(cell.x) + 0.5) * self.cell_size,
            (f64::from(cell.y) + 0.5) * self.cell_size,
        )
    }

    pub fn is_point_passable(&self, point: Point) -> bool {
        self.cell_at(point).is_some_and(|cell| self.is_passable(cell))
    }

    /// Speed multiplier of the terrain under `point`; `1.0` off the grid.
    pub fn speed_multiplier_at(&self, point: Point) -> f64 {
        self.cell_at(point)
            .and_then(|cell| self.terrain(cell))
            .map_or(1.0, TerrainKind::speed_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_round_trips_through_center() {
        let grid = TerrainGrid::new(8, 6, 32.0, TerrainKind::Grass);
        let cell = Cell::new(3, 5);
        assert_eq!(grid.cell_at(grid.cell_center(cell)), Some(cell));
        assert_eq!(grid.cell_at(Point::new(256.0, 10.0)), None);
        assert_eq!(grid.clamp_cell(Point::new(-5.0, 900.0)), Cell::new(0, 5));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![
            vec![TerrainKind::Grass, TerrainKind::Grass],
            vec![TerrainKind::Grass],
        ];
        assert!(matches!(
            TerrainGrid::from_rows(32.0, rows),
            Err(GridError::RaggedRow { row: 1, .. })
        ));
    }
}
