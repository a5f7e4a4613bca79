//! AI driving: lane following, car-following slowdowns, siren yields,
//! intersection turns, and soft respawn for vehicles that wander off-map.

use bevy::prelude::*;
use rand::Rng;

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position};
use crate::roads::RoadNetwork;
use crate::sim_rng::SimRng;
use crate::vehicle::{Vehicle, VehicleState};

use super::active_siren;

/// Seconds a pulled-over vehicle waits before resuming.
pub const PULLOVER_SECONDS: f32 = 30.0;

/// Shoulder-pull speed while yielding to a siren, px/s.
const SIREN_NUDGE_SPEED: f32 = 60.0;

pub fn ai_drive(
    time: Res<Time>,
    grid: Res<CityGrid>,
    roads: Res<RoadNetwork>,
    mut rng: ResMut<SimRng>,
    mut vehicles: Query<(Entity, &mut Vehicle, &mut Position)>,
) {
    let dt = time.delta_secs();
    let siren = active_siren(vehicles.iter().map(|(_, v, p)| (v, p)));
    let snapshot: Vec<(Entity, Vec2)> = vehicles.iter().map(|(e, _, p)| (e, p.vec())).collect();
    let entries = roads.entry_points(&grid);

    for (entity, mut vehicle, mut pos) in &mut vehicles {
        match vehicle.state {
            VehicleState::Ai => {}
            VehicleState::PulledOver => {
                vehicle.current_speed = 0.0;
                vehicle.pulled_over_timer -= dt;
                if vehicle.pulled_over_timer <= 0.0 {
                    vehicle.state = VehicleState::Ai;
                    vehicle.current_speed = vehicle.ai_speed;
                }
                continue;
            }
            // Parked and player-driven vehicles are handled elsewhere.
            _ => continue,
        }

        // Yield to a nearby siren: remember where we were, creep toward the
        // shoulder (at most one lane-width from that origin) and stop dead.
        if let Some((siren_pos, _)) = siren {
            if pos.vec().distance(siren_pos) < TILE_SIZE * 8.0 {
                let origin = *vehicle.siren_refuge.get_or_insert(pos.vec());
                if vehicle.direction.is_horizontal() {
                    let room = TILE_SIZE - (pos.y - origin.y).abs();
                    pos.y += (SIREN_NUDGE_SPEED * dt).min(room).max(0.0);
                } else {
                    let room = TILE_SIZE - (pos.x - origin.x).abs();
                    pos.x += (SIREN_NUDGE_SPEED * dt).min(room).max(0.0);
                }
                vehicle.current_speed = 0.0;
                vehicle.angle = vehicle.direction.angle();
                continue;
            }
        } else if vehicle.siren_refuge.is_some() {
            vehicle.siren_refuge = None;
        }

        // Car-following against whatever sits ahead in the lane band.
        let ahead = distance_ahead(&snapshot, entity, vehicle.direction, pos.vec());
        vehicle.current_speed = if ahead < TILE_SIZE * 1.5 {
            0.0
        } else if ahead < TILE_SIZE * 3.0 {
            vehicle.ai_speed * 0.4
        } else {
            vehicle.ai_speed
        };

        let step = vehicle.direction.offset() * vehicle.current_speed * dt;
        pos.x += step.x;
        pos.y += step.y;
        vehicle.angle = vehicle.direction.angle();

        // Two tiles past the map edge: soft-respawn onto a random lane entry.
        let margin = TILE_SIZE * 2.0;
        if pos.x < -margin
            || pos.x > (grid.width as f32 + 2.0) * TILE_SIZE
            || pos.y < -margin
            || pos.y > (grid.height as f32 + 2.0) * TILE_SIZE
        {
            if let Some(&(spawn, dir)) = pick(&entries, &mut rng) {
                pos.x = spawn.x;
                pos.y = spawn.y;
                vehicle.direction = dir;
                vehicle.angle = dir.angle();
                vehicle.last_intersection = None;
                vehicle.reroll_speed(&mut rng);
            }
            continue;
        }

        decide_at_intersection(&roads, &mut vehicle, &mut pos, &mut rng);
    }
}

/// Distance to the nearest vehicle ahead within a one-tile perpendicular
/// band. Deliberately direction-agnostic about the other vehicle: oncoming
/// and parked cars in the band also trigger the slowdown.
fn distance_ahead(snapshot: &[(Entity, Vec2)], me: Entity, dir: Direction, p: Vec2) -> f32 {
    let check = TILE_SIZE * 3.0;
    let mut closest = f32::INFINITY;
    for &(other, op) in snapshot {
        if other == me {
            continue;
        }
        let (ahead, lateral) = match dir {
            Direction::Right => (op.x - p.x, (op.y - p.y).abs()),
            Direction::Left => (p.x - op.x, (op.y - p.y).abs()),
            Direction::Down => (op.y - p.y, (op.x - p.x).abs()),
            Direction::Up => (p.y - op.y, (op.x - p.x).abs()),
        };
        if ahead > 0.0 && ahead < check && lateral < TILE_SIZE && ahead < closest {
            closest = ahead;
        }
    }
    closest
}

/// On first entry to an intersection cell, roll 25% left / 25% right / 50%
/// straight. A turn only commits when the network has a lane in the new
/// direction, and snaps the off-axis coordinate onto that lane's centerline.
fn decide_at_intersection(
    roads: &RoadNetwork,
    vehicle: &mut Vehicle,
    pos: &mut Position,
    rng: &mut SimRng,
) {
    let (col, row) = pos.tile();
    if roads.is_intersection(col, row) {
        if vehicle.last_intersection == Some((col, row)) {
            return;
        }
        vehicle.last_intersection = Some((col, row));
        let roll: f32 = rng.0.gen();
        let new_dir = if roll < 0.25 {
            vehicle.direction.turned_left()
        } else if roll < 0.5 {
            vehicle.direction.turned_right()
        } else {
            return;
        };
        if !roads.has_lane(new_dir) {
            return;
        }
        vehicle.direction = new_dir;
        vehicle.angle = new_dir.angle();
        if new_dir.is_horizontal() {
            if let Some(centerline) = roads.snap_to_lane(new_dir, row) {
                pos.y = centerline;
            }
        } else if let Some(centerline) = roads.snap_to_lane(new_dir, col) {
            pos.x = centerline;
        }
    } else if let Some((last_col, last_row)) = vehicle.last_intersection {
        // Forget the key once clear of the crossing so the next visit
        // re-decides.
        let dx = (col - last_col) as f32;
        let dy = (row - last_row) as f32;
        if (dx * dx + dy * dy).sqrt() > 2.0 {
            vehicle.last_intersection = None;
        }
    }
}

fn pick<'a, T>(items: &'a [T], rng: &mut SimRng) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.0.gen_range(0..items.len())])
    }
}
