//! Road-lane graph derived once from the tile grid.
//!
//! Wide road strips are collapsed to one lane index per travel direction:
//! rows (or columns) with more than 60% road coverage are lane candidates,
//! adjacent indices merge into runs, and the two directions of travel pin to
//! opposite edges of each run. A tile is an intersection when it and all four
//! orthogonal neighbors are road — the only places AI vehicles reconsider
//! their direction.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, TileKind};

/// Road density a row/column needs to count as a lane candidate.
const LANE_DENSITY: f32 = 0.6;

#[derive(Resource, Default, Debug, Clone)]
pub struct RoadNetwork {
    /// Row indices for rightward travel (last row of each horizontal run).
    pub right: Vec<usize>,
    /// Row indices for leftward travel (first row of each horizontal run).
    pub left: Vec<usize>,
    /// Column indices for downward travel (last column of each vertical run).
    pub down: Vec<usize>,
    /// Column indices for upward travel (first column of each vertical run).
    pub up: Vec<usize>,
    /// Tile coords whose four orthogonal neighbors are all road.
    pub intersections: HashSet<(usize, usize)>,
}

impl RoadNetwork {
    pub fn from_grid(grid: &CityGrid) -> Self {
        let mut rows = Vec::new();
        for r in 0..grid.height {
            let road = (0..grid.width)
                .filter(|&c| grid.get(c, r) == TileKind::Road)
                .count();
            if road as f32 > grid.width as f32 * LANE_DENSITY {
                rows.push(r);
            }
        }
        let mut cols = Vec::new();
        for c in 0..grid.width {
            let road = (0..grid.height)
                .filter(|&r| grid.get(c, r) == TileKind::Road)
                .count();
            if road as f32 > grid.height as f32 * LANE_DENSITY {
                cols.push(c);
            }
        }

        let h_runs = group_adjacent(&rows);
        let v_runs = group_adjacent(&cols);

        let mut intersections = HashSet::new();
        for r in 1..grid.height.saturating_sub(1) {
            for c in 1..grid.width.saturating_sub(1) {
                if grid.get(c, r) == TileKind::Road
                    && grid.get(c, r - 1) == TileKind::Road
                    && grid.get(c, r + 1) == TileKind::Road
                    && grid.get(c - 1, r) == TileKind::Road
                    && grid.get(c + 1, r) == TileKind::Road
                {
                    intersections.insert((c, r));
                }
            }
        }

        let network = Self {
            right: h_runs.iter().map(|run| *run.last().unwrap()).collect(),
            left: h_runs.iter().map(|run| run[0]).collect(),
            down: v_runs.iter().map(|run| *run.last().unwrap()).collect(),
            up: v_runs.iter().map(|run| run[0]).collect(),
            intersections,
        };
        if network.right.is_empty() && network.down.is_empty() {
            warn!("road network is empty; AI vehicles will not move");
        }
        network
    }

    pub fn lanes(&self, dir: Direction) -> &[usize] {
        match dir {
            Direction::Right => &self.right,
            Direction::Left => &self.left,
            Direction::Down => &self.down,
            Direction::Up => &self.up,
        }
    }

    pub fn has_lane(&self, dir: Direction) -> bool {
        !self.lanes(dir).is_empty()
    }

    pub fn is_intersection(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && self.intersections.contains(&(col as usize, row as usize))
    }

    /// Lane index closest to a tile coordinate (row for horizontal travel,
    /// column for vertical).
    pub fn nearest_lane(&self, dir: Direction, tile: i32) -> Option<usize> {
        self.lanes(dir)
            .iter()
            .copied()
            .min_by_key(|&lane| (lane as i32 - tile).unsigned_abs())
    }

    /// World-pixel centerline coordinate of the nearest lane.
    pub fn snap_to_lane(&self, dir: Direction, tile: i32) -> Option<f32> {
        self.nearest_lane(dir, tile)
            .map(|lane| lane as f32 * TILE_SIZE + TILE_SIZE * 0.5)
    }

    /// Map-edge spawn points, one per lane, facing inward. Used for initial
    /// spawning and for soft-respawning off-map vehicles.
    pub fn entry_points(&self, grid: &CityGrid) -> Vec<(Vec2, Direction)> {
        let mut points = Vec::new();
        for &row in &self.right {
            let y = row as f32 * TILE_SIZE + TILE_SIZE * 0.5;
            points.push((Vec2::new(TILE_SIZE, y), Direction::Right));
        }
        for &row in &self.left {
            let y = row as f32 * TILE_SIZE + TILE_SIZE * 0.5;
            let x = (grid.width as f32 - 2.0) * TILE_SIZE;
            points.push((Vec2::new(x, y), Direction::Left));
        }
        for &col in &self.down {
            let x = col as f32 * TILE_SIZE + TILE_SIZE * 0.5;
            points.push((Vec2::new(x, TILE_SIZE), Direction::Down));
        }
        for &col in &self.up {
            let x = col as f32 * TILE_SIZE + TILE_SIZE * 0.5;
            let y = (grid.height as f32 - 2.0) * TILE_SIZE;
            points.push((Vec2::new(x, y), Direction::Up));
        }
        points
    }
}

/// Split a sorted index list into runs of consecutive values.
fn group_adjacent(sorted: &[usize]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for &idx in sorted {
        match groups.last_mut() {
            Some(run) if *run.last().unwrap() + 1 == idx => run.push(idx),
            _ => groups.push(vec![idx]),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20x20 grid with a two-tile horizontal road strip on rows 8-9 and a
    /// two-tile vertical strip on columns 4-5.
    fn cross_grid() -> CityGrid {
        let mut grid = CityGrid::new(20, 20);
        for c in 0..20 {
            grid.set(c, 8, TileKind::Road);
            grid.set(c, 9, TileKind::Road);
        }
        for r in 0..20 {
            grid.set(4, r, TileKind::Road);
            grid.set(5, r, TileKind::Road);
        }
        grid
    }

    #[test]
    fn test_lanes_pin_to_run_edges() {
        let network = RoadNetwork::from_grid(&cross_grid());
        assert_eq!(network.left, vec![8]);
        assert_eq!(network.right, vec![9]);
        assert_eq!(network.up, vec![4]);
        assert_eq!(network.down, vec![5]);
    }

    #[test]
    fn test_intersections_at_crossing() {
        let network = RoadNetwork::from_grid(&cross_grid());
        // The 2x2 crossing plus the road cells bordered by road on all sides.
        assert!(network.intersections.contains(&(4, 8)));
        assert!(network.intersections.contains(&(5, 9)));
        // A plain straight-road cell is not an intersection.
        assert!(!network.intersections.contains(&(10, 8)));
    }

    #[test]
    fn test_group_adjacent_runs() {
        assert_eq!(
            group_adjacent(&[3, 4, 5, 9, 10, 14]),
            vec![vec![3, 4, 5], vec![9, 10], vec![14]]
        );
        assert!(group_adjacent(&[]).is_empty());
    }

    #[test]
    fn test_degenerate_map_has_no_lanes() {
        let grid = CityGrid::new(12, 12);
        let network = RoadNetwork::from_grid(&grid);
        assert!(!network.has_lane(Direction::Right));
        assert!(!network.has_lane(Direction::Up));
        assert!(network.intersections.is_empty());
        assert!(network.entry_points(&grid).is_empty());
    }

    #[test]
    fn test_nearest_lane_picks_closest() {
        let mut grid = CityGrid::new(20, 20);
        for c in 0..20 {
            grid.set(c, 3, TileKind::Road);
            grid.set(c, 15, TileKind::Road);
        }
        let network = RoadNetwork::from_grid(&grid);
        assert_eq!(network.nearest_lane(Direction::Right, 5), Some(3));
        assert_eq!(network.nearest_lane(Direction::Right, 12), Some(15));
    }
}
