//! Player-driven vehicle physics: one throttle axis with asymmetric
//! brake/reverse behavior, speed-scaled steering, and the axis-separated
//! collision response.

use bevy::prelude::*;

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position};
use crate::sim_rng::SimRng;
use crate::vehicle::{Vehicle, VehicleState};

use super::{solid_for_vehicle, DriveInput, TrafficEvents};

/// Below this speed the vehicle can't steer and friction snaps it to rest.
const CREEP_SPEED: f32 = 5.0;

/// Speed above which hitting another vehicle counts as a crash.
const CRASH_SPEED: f32 = 30.0;

pub fn player_drive(
    time: Res<Time>,
    grid: Res<CityGrid>,
    input: Res<DriveInput>,
    mut events: ResMut<TrafficEvents>,
    mut rng: ResMut<SimRng>,
    mut vehicles: Query<(Entity, &mut Vehicle, &mut Position)>,
) {
    let dt = time.delta_secs();
    events.tick(dt);

    let snapshot: Vec<(Entity, f32, Vec2, VehicleState)> = vehicles
        .iter()
        .map(|(e, v, p)| (e, v.collision_radius(), p.vec(), v.state))
        .collect();
    let Some(&(player, radius, _, _)) = snapshot
        .iter()
        .find(|(_, _, _, state)| *state == VehicleState::PlayerDriven)
    else {
        return;
    };
    let Ok((_, mut vehicle, mut pos)) = vehicles.get_mut(player) else {
        return;
    };
    let profile = vehicle.kind.profile();

    // One control, asymmetric behavior: reverse input brakes while rolling
    // forward and reverses at half acceleration near standstill.
    if input.throttle > 0.0 {
        vehicle.velocity += profile.acceleration * dt;
    } else if input.throttle < 0.0 {
        if vehicle.velocity > 10.0 {
            vehicle.velocity -= profile.braking * dt;
        } else {
            vehicle.velocity -= profile.acceleration * 0.5 * dt;
        }
    } else if vehicle.velocity.abs() < CREEP_SPEED {
        vehicle.velocity = 0.0;
    } else if vehicle.velocity > 0.0 {
        vehicle.velocity -= profile.friction * dt;
    } else {
        vehicle.velocity += profile.friction * dt;
    }
    vehicle.velocity = vehicle
        .velocity
        .clamp(-profile.max_player_speed * 0.3, profile.max_player_speed);

    // Steering authority scales with speed; a stationary vehicle can't pivot,
    // and reversing mirrors the wheel.
    if vehicle.velocity.abs() > CREEP_SPEED {
        let speed_factor = (vehicle.velocity.abs() / profile.max_player_speed).min(1.0);
        let turn = profile.turn_speed * speed_factor * dt * vehicle.velocity.signum();
        if input.steer > 0.0 {
            vehicle.angle += turn;
        } else if input.steer < 0.0 {
            vehicle.angle -= turn;
        }
    }
    while vehicle.angle > std::f32::consts::PI {
        vehicle.angle -= std::f32::consts::TAU;
    }
    while vehicle.angle < -std::f32::consts::PI {
        vehicle.angle += std::f32::consts::TAU;
    }

    let move_x = vehicle.angle.sin() * vehicle.velocity * dt;
    let move_y = -vehicle.angle.cos() * vehicle.velocity * dt;
    let new_x = pos.x + move_x;
    let new_y = pos.y + move_y;

    // Full move, then each axis alone; fully blocked bounces back softly.
    if !solid_for_vehicle(&grid, new_x, new_y, radius) {
        pos.x = new_x;
        pos.y = new_y;
    } else if !solid_for_vehicle(&grid, new_x, pos.y, radius) {
        pos.x = new_x;
        vehicle.velocity *= 0.5;
    } else if !solid_for_vehicle(&grid, pos.x, new_y, radius) {
        pos.y = new_y;
        vehicle.velocity *= 0.5;
    } else {
        vehicle.velocity *= -0.3;
    }

    // Push-apart against every other vehicle; only the player reacts.
    for &(other, other_radius, other_pos, other_state) in &snapshot {
        if other == player || other_state == VehicleState::PlayerDriven {
            continue;
        }
        let delta = pos.vec() - other_pos;
        let dist = delta.length();
        let min_dist = radius + other_radius;
        if dist < min_dist && vehicle.velocity.abs() > CRASH_SPEED {
            let axis = if dist > 0.0 { delta / dist } else { Vec2::X };
            let overlap = min_dist - dist;
            pos.x += axis.x * overlap * 0.5;
            pos.y += axis.y * overlap * 0.5;
            vehicle.velocity *= -0.3;
            events.report_crash(&mut rng);
            break;
        }
    }

    // Never leave the map, whatever the physics said.
    pos.x = pos.x.clamp(TILE_SIZE, grid.pixel_width() - TILE_SIZE);
    pos.y = pos.y.clamp(TILE_SIZE, grid.pixel_height() - TILE_SIZE);

    vehicle.direction = Direction::from_angle(vehicle.angle);
}
