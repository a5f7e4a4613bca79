use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TILE_SIZE;

/// Axis-aligned rectangle in world pixels. Used for pedestrian wandering
/// bounds, exclusion areas, and the ride drop-off rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Zone {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Zone covering an inclusive tile rectangle, shrunk by `inset` pixels on
    /// every side.
    pub fn from_tiles(cols: (usize, usize), rows: (usize, usize), inset: f32) -> Self {
        Self {
            x1: cols.0 as f32 * TILE_SIZE + inset,
            y1: rows.0 as f32 * TILE_SIZE + inset,
            x2: (cols.1 + 1) as f32 * TILE_SIZE - inset,
            y2: (rows.1 + 1) as f32 * TILE_SIZE - inset,
        }
    }

    /// Same tile rectangle, grown outward instead.
    pub fn from_tiles_padded(cols: (usize, usize), rows: (usize, usize), pad: f32) -> Self {
        Self::from_tiles(cols, rows, -pad)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    pub fn contains_vec(&self, p: Vec2) -> bool {
        self.contains(p.x, p.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}
