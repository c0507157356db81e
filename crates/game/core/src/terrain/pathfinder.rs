use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::f64::consts::SQRT_2;
use std::sync::Arc;

use super::grid::{Cell, TerrainGrid};
use crate::state::Point;

/// Cached cell paths before the cache is flushed.
const CACHE_CAPACITY: usize = 1024;

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    order: u64,
    index: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Min-heap on f, then first pushed.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// A* search over a [`TerrainGrid`] with path smoothing and a cell-path cache.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    grid: Arc<TerrainGrid>,
    cache: HashMap<(Cell, Cell), Option<Vec<Cell>>>,
}

impl Pathfinder {
    pub fn new(grid: Arc<TerrainGrid>) -> Self {
        Self {
            grid,
            cache: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }

    /// World waypoints from `from` to `to`, excluding the start position.
    ///
    /// The last waypoint is `to` itself, or the centre of the nearest passable
    /// cell when `to` lies on impassable terrain. `None` when unreachable.
    pub fn find_path(&mut self, from: Point, to: Point) -> Option<Vec<Point>> {
        let start = self.grid.clamp_cell(from);
        let requested = self.grid.clamp_cell(to);

        let (goal, end) = if self.grid.is_passable(requested) && self.grid.cell_at(to).is_some() {
            (requested, to)
        } else {
            let substitute = self.nearest_passable(requested)?;
            (substitute, self.grid.cell_center(substitute))
        };

        let cells = self.cell_path(start, goal)?;
        let mut waypoints: Vec<Point> = cells
            .iter()
            .skip(1)
            .map(|cell| self.grid.cell_center(*cell))
            .collect();
        match waypoints.last_mut() {
            Some(last) => *last = end,
            None => waypoints.push(end),
        }

        Some(self.smooth(from, waypoints))
    }

    /// Cached A* between two cells, inclusive of both ends.
    pub fn cell_path(&mut self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        if let Some(cached) = self.cache.get(&(start, goal)) {
            return cached.clone();
        }
        if self.cache.len() >= CACHE_CAPACITY {
            self.cache.clear();
        }
        let path = astar(&self.grid, start, goal);
        self.cache.insert((start, goal), path.clone());
        path
    }

    /// Closest passable cell to `cell` by breadth-first search, `cell` included.
    pub fn nearest_passable(&self, cell: Cell) -> Option<Cell> {
        let grid = &self.grid;
        if !grid.contains(cell) {
            return None;
        }

        let mut visited = vec![false; grid.cell_count()];
        let mut queue = VecDeque::from([cell]);
        visited[grid.index(cell)] = true;

        while let Some(current) = queue.pop_front() {
            if grid.is_passable(current) {
                return Some(current);
            }
            for next in neighbours(grid, current) {
                let index = grid.index(next);
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Line of sight between two world points, sampled every half cell.
    pub fn line_of_sight(&self, from: Point, to: Point) -> bool {
        let step = self.grid.cell_size() / 2.0;
        let distance = from.distance(to);
        let samples = (distance / step).ceil() as u32;
        (0..=samples).all(|i| {
            let t = if samples == 0 {
                1.0
            } else {
                f64::from(i) / f64::from(samples)
            };
            let sample = from + (to - from) * t;
            self.grid.is_passable(self.grid.clamp_cell(sample))
        })
    }

    /// Drops waypoints that can be skipped in a straight line.
    fn smooth(&self, from: Point, waypoints: Vec<Point>) -> Vec<Point> {
        let mut smoothed = Vec::with_capacity(waypoints.len());
        let mut anchor = from;
        let mut index = 0;

        while index < waypoints.len() {
            let mut furthest = index;
            for candidate in (index + 1..waypoints.len()).rev() {
                if self.line_of_sight(anchor, waypoints[candidate]) {
                    furthest = candidate;
                    break;
                }
            }
            smoothed.push(waypoints[furthest]);
            anchor = waypoints[furthest];
            index = furthest + 1;
        }
        smoothed
    }
}

fn neighbours(grid: &TerrainGrid, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
    NEIGHBOURS.iter().filter_map(move |&(dx, dy)| offset(grid, cell, dx, dy))
}

fn offset(grid: &TerrainGrid, cell: Cell, dx: i32, dy: i32) -> Option<Cell> {
    let x = cell.x.checked_add_signed(dx)?;
    let y = cell.y.checked_add_signed(dy)?;
    let next = Cell::new(x, y);
    grid.contains(next).then_some(next)
}

fn octile(a: Cell, b: Cell) -> f64 {
    let dx = f64::from(a.x.abs_diff(b.x));
    let dy = f64::from(a.y.abs_diff(b.y));
    (dx + dy) + (SQRT_2 - 2.0) * dx.min(dy)
}

/// 8-directional A*. Diagonals require both orthogonal neighbours passable.
fn astar(grid: &TerrainGrid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    if !grid.is_passable(start) || !grid.is_passable(goal) {
        return None;
    }

    let count = grid.cell_count();
    let mut g_score = vec![f64::INFINITY; count];
    let mut came_from: Vec<Option<usize>> = vec![None; count];
    let mut closed = vec![false; count];
    let mut open = BinaryHeap::new();
    let mut order = 0_u64;

    let start_index = grid.index(start);
    let goal_index = grid.index(goal);
    g_score[start_index] = 0.0;
    open.push(OpenNode {
        f: octile(start, goal),
        order,
        index: start_index,
    });

    while let Some(OpenNode { index, .. }) = open.pop() {
        if index == goal_index {
            return Some(reconstruct(grid, &came_from, goal_index));
        }
        if closed[index] {
            continue;
        }
        closed[index] = true;

        let current = grid.cell_from_index(index);
        for &(dx, dy) in &NEIGHBOURS {
            let Some(next) = offset(grid, current, dx, dy) else {
                continue;
            };
            let Some(terrain) = grid.terrain(next).filter(|kind| kind.is_passable()) else {
                continue;
            };
            let diagonal = dx != 0 && dy != 0;
            if diagonal {
                let side_a = offset(grid, current, dx, 0).is_some_and(|c| grid.is_passable(c));
                let side_b = offset(grid, current, 0, dy).is_some_and(|c| grid.is_passable(c));
                if !(side_a && side_b) {
                    continue;
                }
            }

            let step = if diagonal { SQRT_2 } else { 1.0 };
            let tentative = g_score[index] + step * terrain.path_weight();
            let next_index = grid.index(next);
            if tentative < g_score[next_index] {
                g_score[next_index] = tentative;
                came_from[next_index] = Some(index);
                order += 1;
                open.push(OpenNode {
                    f: tentative + octile(next, goal),
                    order,
                    index: next_index,
                });
            }
        }
    }

    None
}

fn reconstruct(grid: &TerrainGrid, came_from: &[Option<usize>], goal: usize) -> Vec<Cell> {
    let mut path = vec![grid.cell_from_index(goal)];
    let mut current = goal;
    while let Some(previous) = came_from[current] {
        path.push(grid.cell_from_index(previous));
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;

    /// 10x10 grass with a rock wall in column 5.
    fn walled(gap: Option<u32>) -> TerrainGrid {
        let mut grid = TerrainGrid::new(10, 10, 32.0, TerrainKind::Grass);
        for y in 0..10 {
            if Some(y) != gap {
                grid.set(Cell::new(5, y), TerrainKind::Rock);
            }
        }
        grid
    }

    fn is_diagonal_cut(grid: &TerrainGrid, a: Cell, b: Cell) -> bool {
        a.x != b.x
            && a.y != b.y
            && (!grid.is_passable(Cell::new(b.x, a.y)) || !grid.is_passable(Cell::new(a.x, b.y)))
    }

    #[test]
    fn full_wall_blocks_path() {
        let mut pathfinder = Pathfinder::new(Arc::new(walled(None)));
        assert_eq!(pathfinder.cell_path(Cell::new(1, 1), Cell::new(8, 8)), None);
        assert_eq!(
            pathfinder.find_path(Point::new(40.0, 40.0), Point::new(280.0, 280.0)),
            None
        );
    }

    #[test]
    fn single_gap_is_used_without_corner_cutting() {
        let grid = walled(Some(4));
        let mut pathfinder = Pathfinder::new(Arc::new(grid.clone()));

        let path = pathfinder
            .cell_path(Cell::new(1, 1), Cell::new(8, 8))
            .expect("path through the gap");

        assert_eq!(path.first(), Some(&Cell::new(1, 1)));
        assert_eq!(path.last(), Some(&Cell::new(8, 8)));
        assert!(path.contains(&Cell::new(5, 4)));
        assert!(path.iter().all(|cell| grid.is_passable(*cell)));
        for pair in path.windows(2) {
            assert!(!is_diagonal_cut(&grid, pair[0], pair[1]), "cut corner {pair:?}");
        }
    }

    #[test]
    fn corner_cutting_forbidden_on_open_diagonal() {
        // Start (0,0), goal (1,1); (1,0) is rock so the diagonal is illegal.
        let mut grid = TerrainGrid::new(3, 3, 32.0, TerrainKind::Road);
        grid.set(Cell::new(1, 0), TerrainKind::Rock);
        let mut pathfinder = Pathfinder::new(Arc::new(grid));

        let path = pathfinder
            .cell_path(Cell::new(0, 0), Cell::new(1, 1))
            .expect("path");
        assert_eq!(path, vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1)]);
    }

    #[test]
    fn world_path_ends_at_requested_point() {
        let mut pathfinder = Pathfinder::new(Arc::new(walled(Some(4))));
        let target = Point::new(270.0, 281.0);

        let path = pathfinder
            .find_path(Point::new(40.0, 40.0), target)
            .expect("path");

        assert_eq!(path.last(), Some(&target));
        assert_eq!(pathfinder.cached_paths(), 1);
    }

    #[test]
    fn impassable_goal_substitutes_nearest_passable() {
        let mut pathfinder = Pathfinder::new(Arc::new(walled(Some(4))));
        // Click on rock cell (5, 2); BFS visits (6, 2) first.
        let path = pathfinder
            .find_path(Point::new(16.0, 80.0), Point::new(176.0, 80.0))
            .expect("path to substitute");
        let end = *path.last().expect("non-empty");
        assert_eq!(end, pathfinder.grid().cell_center(Cell::new(6, 2)));
    }

    #[test]
    fn smoothing_collapses_straight_runs() {
        let mut pathfinder = Pathfinder::new(Arc::new(TerrainGrid::new(
            10,
            3,
            32.0,
            TerrainKind::Road,
        )));
        let path = pathfinder
            .find_path(Point::new(16.0, 48.0), Point::new(304.0, 48.0))
            .expect("path");
        assert_eq!(path, vec![Point::new(304.0, 48.0)]);
    }
}
