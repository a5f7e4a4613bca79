use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TILE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TileKind {
    #[default]
    Grass,
    Road,
    Sidewalk,
    Building,
    Tree,
    Water,
    Sand,
    Concrete,
    Flowers,
    Fence,
    Cone,
    Snow,
}

impl TileKind {
    /// Tiles that block both vehicles and pedestrians.
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            TileKind::Building | TileKind::Tree | TileKind::Water | TileKind::Fence | TileKind::Cone
        )
    }
}

/// The static city map: a flat row-major tile grid, authored by the host and
/// never mutated by the simulation.
#[derive(Resource, Serialize, Deserialize)]
pub struct CityGrid {
    pub tiles: Vec<TileKind>,
    pub width: usize,
    pub height: usize,
}

impl Default for CityGrid {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

impl CityGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            tiles: vec![TileKind::Grass; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> TileKind {
        self.tiles[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, kind: TileKind) {
        self.tiles[row * self.width + col] = kind;
    }

    /// Solidity test in world pixels. Off-map counts as solid.
    pub fn solid_at(&self, x: f32, y: f32) -> bool {
        let (col, row) = Self::world_to_tile(x, y);
        if !self.in_bounds(col, row) {
            return true;
        }
        self.get(col as usize, row as usize).is_solid()
    }

    pub fn world_to_tile(x: f32, y: f32) -> (i32, i32) {
        ((x / TILE_SIZE).floor() as i32, (y / TILE_SIZE).floor() as i32)
    }

    /// Center of a tile in world pixels.
    pub fn tile_to_world(col: usize, row: usize) -> Vec2 {
        Vec2::new(
            col as f32 * TILE_SIZE + TILE_SIZE * 0.5,
            row as f32 * TILE_SIZE + TILE_SIZE * 0.5,
        )
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }
}

/// World-pixel position (entity center) shared by vehicles and pedestrians.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn tile(&self) -> (i32, i32) {
        CityGrid::world_to_tile(self.x, self.y)
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        self.vec().distance(other)
    }
}

/// Discrete facing used by AI vehicles and wandering pedestrians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in world axes (screen-style: +y is down).
    pub fn offset(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    pub fn turned_left(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    pub fn turned_right(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Heading angle, up = 0, clockwise positive.
    pub fn angle(self) -> f32 {
        match self {
            Direction::Up => 0.0,
            Direction::Right => std::f32::consts::FRAC_PI_2,
            Direction::Down => std::f32::consts::PI,
            Direction::Left => -std::f32::consts::FRAC_PI_2,
        }
    }

    /// Nearest discrete direction for a continuous heading angle.
    pub fn from_angle(angle: f32) -> Direction {
        let tau = std::f32::consts::TAU;
        let a = angle.rem_euclid(tau);
        if a < tau * 0.125 || a >= tau * 0.875 {
            Direction::Up
        } else if a < tau * 0.375 {
            Direction::Right
        } else if a < tau * 0.625 {
            Direction::Down
        } else {
            Direction::Left
        }
    }

    /// Direction that best matches a movement vector.
    pub fn from_vec(v: Vec2) -> Direction {
        if v.x.abs() >= v.y.abs() {
            if v.x >= 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if v.y >= 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_tiles() {
        assert!(TileKind::Building.is_solid());
        assert!(TileKind::Water.is_solid());
        assert!(TileKind::Cone.is_solid());
        assert!(!TileKind::Road.is_solid());
        assert!(!TileKind::Sidewalk.is_solid());
        assert!(!TileKind::Snow.is_solid());
    }

    #[test]
    fn test_world_tile_roundtrip() {
        let center = CityGrid::tile_to_world(5, 9);
        assert_eq!(CityGrid::world_to_tile(center.x, center.y), (5, 9));
    }

    #[test]
    fn test_solid_at_off_map() {
        let grid = CityGrid::new(8, 8);
        assert!(grid.solid_at(-10.0, 4.0));
        assert!(grid.solid_at(4.0, 8.0 * TILE_SIZE + 1.0));
        assert!(!grid.solid_at(16.0, 16.0));
    }

    #[test]
    fn test_direction_turns_cycle() {
        for dir in Direction::ALL {
            assert_eq!(dir.turned_left().turned_right(), dir);
            let mut d = dir;
            for _ in 0..4 {
                d = d.turned_right();
            }
            assert_eq!(d, dir);
        }
    }

    #[test]
    fn test_direction_angle_roundtrip() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_angle(dir.angle()), dir);
        }
    }
}
