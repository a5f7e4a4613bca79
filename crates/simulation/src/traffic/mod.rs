//! Road traffic: AI-driven ambient cars, the player-driven vehicle, and the
//! collision model they share.

pub mod ai;
pub mod player;


use bevy::prelude::*;
use rand::Rng;

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position};
use crate::roads::RoadNetwork;
use crate::sim_rng::SimRng;
use crate::simulation_sets::SimulationSet;
use crate::vehicle::{Vehicle, VehicleKind, VehicleState};

/// Per-frame driving input for the player vehicle, written by the host.
/// `throttle` > 0 accelerates, < 0 brakes/reverses; `steer` > 0 turns right.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct DriveInput {
    pub throttle: f32,
    pub steer: f32,
}

const CRASH_LINES: &[&str] = &[
    "Take your aggressiveness somewhere else!",
    "I have no insurance!",
    "Fender bender!",
];

/// One-shot traffic events the host drains for UI feedback.
#[derive(Resource, Default)]
pub struct TrafficEvents {
    crash_line: Option<&'static str>,
    crash_cooldown: f32,
}

impl TrafficEvents {
    pub(crate) fn tick(&mut self, dt: f32) {
        self.crash_cooldown = (self.crash_cooldown - dt).max(0.0);
    }

    /// Record a crash reaction, rate-limited to one line per 3 seconds.
    pub(crate) fn report_crash(&mut self, rng: &mut SimRng) {
        if self.crash_cooldown <= 0.0 {
            self.crash_line = Some(CRASH_LINES[rng.0.gen_range(0..CRASH_LINES.len())]);
            self.crash_cooldown = 3.0;
        }
    }

    /// Drain-once: the pending crash line, if any.
    pub fn claim_crash_line(&mut self) -> Option<&'static str> {
        self.crash_line.take()
    }
}

/// Circular-footprint solidity test over the covered tile range. Conservative
/// for rotated vehicles, which is acceptable at these footprint sizes.
pub fn solid_for_vehicle(grid: &CityGrid, cx: f32, cy: f32, radius: f32) -> bool {
    let start_col = ((cx - radius) / TILE_SIZE).floor() as i32;
    let end_col = ((cx + radius) / TILE_SIZE).floor() as i32;
    let start_row = ((cy - radius) / TILE_SIZE).floor() as i32;
    let end_row = ((cy + radius) / TILE_SIZE).floor() as i32;
    for row in start_row..=end_row {
        for col in start_col..=end_col {
            if !grid.in_bounds(col, row) {
                return true;
            }
            if grid.get(col as usize, row as usize).is_solid() {
                return true;
            }
        }
    }
    false
}

/// Spawn `count` ambient AI vehicles of casual kinds onto random lanes.
pub fn spawn_ai_vehicles(
    commands: &mut Commands,
    grid: &CityGrid,
    roads: &RoadNetwork,
    rng: &mut SimRng,
    count: usize,
) {
    let mut lanes: Vec<(Direction, usize)> = Vec::new();
    for dir in Direction::ALL {
        lanes.extend(roads.lanes(dir).iter().map(|&lane| (dir, lane)));
    }
    if lanes.is_empty() {
        warn!("no lanes to spawn vehicles on");
        return;
    }
    for i in 0..count {
        let kind = VehicleKind::CASUAL[i % VehicleKind::CASUAL.len()];
        let (dir, lane) = lanes[rng.0.gen_range(0..lanes.len())];
        let centerline = lane as f32 * TILE_SIZE + TILE_SIZE * 0.5;
        let pos = if dir.is_horizontal() {
            let x = (4.0 + rng.0.gen::<f32>() * (grid.width as f32 - 8.0)) * TILE_SIZE;
            Position::new(x, centerline)
        } else {
            let y = (4.0 + rng.0.gen::<f32>() * (grid.height as f32 - 8.0)) * TILE_SIZE;
            Position::new(centerline, y)
        };
        commands.spawn((Vehicle::new(kind, dir, VehicleState::Ai, rng), pos));
    }
    info!("spawned {count} ai vehicles");
}

/// Spawn a parked vehicle centered on a tile. The host places these at
/// map-authored spots; missions may add more at runtime.
pub fn spawn_parked_at(
    commands: &mut Commands,
    kind: VehicleKind,
    col: usize,
    row: usize,
    dir: Direction,
    rng: &mut SimRng,
) -> Entity {
    let center = CityGrid::tile_to_world(col, row);
    commands
        .spawn((
            Vehicle::new(kind, dir, VehicleState::Parked, rng),
            Position::new(center.x, center.y),
        ))
        .id()
}

/// The player-driven vehicle with its siren on, if any.
pub fn active_siren<'a>(
    vehicles: impl IntoIterator<Item = (&'a Vehicle, &'a Position)>,
) -> Option<(Vec2, f32)> {
    vehicles
        .into_iter()
        .find(|(v, _)| v.state == VehicleState::PlayerDriven && v.siren_on)
        .map(|(v, p)| (p.vec(), v.angle))
}

pub struct TrafficPlugin;

impl Plugin for TrafficPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DriveInput>()
            .init_resource::<TrafficEvents>()
            .add_systems(
                FixedUpdate,
                (player::player_drive, ai::ai_drive)
                    .chain()
                    .in_set(SimulationSet::Traffic),
            );
    }
}
