//! Wandering state machine: walk/idle dwell cycles, building visits, and the
//! one-tile siren dodge. A rejected step never freezes a pedestrian — it
//! re-rolls the direction instead.

use bevy::prelude::*;
use rand::Rng;

use crate::basketball::Baller;
use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position};
use crate::pedestrian::{PedState, Pedestrian, Role, INSIDE_TIME_MAX, INSIDE_TIME_MIN};
use crate::sim_rng::SimRng;
use crate::traffic::active_siren;
use crate::vehicle::Vehicle;

use super::{ConstructionZone, DoorRegistry};

/// How fast a pedestrian scrambles out of a siren's path, px/s.
const DODGE_SPEED: f32 = 120.0;

/// Chance per dwell expiry that a civilian heads for a door instead of idling.
const DOOR_CHANCE: f32 = 0.3;

/// Radius at which a door counts as reached.
const DOOR_RADIUS: f32 = 16.0;

pub fn siren_dodge(
    time: Res<Time>,
    vehicles: Query<(&Vehicle, &Position), Without<Pedestrian>>,
    mut peds: Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
    mut rng: ResMut<SimRng>,
) {
    let dt = time.delta_secs();
    let siren = active_siren(vehicles.iter());

    for (mut ped, mut pos) in &mut peds {
        if ped.role != Role::Civilian {
            continue;
        }
        let dodging = matches!(ped.state, PedState::SirenDodge { .. });
        let eligible = dodging || ped.state.can_be_picked_up();
        if !eligible {
            continue;
        }

        let Some((siren_pos, siren_angle)) = siren else {
            if dodging {
                ped.state = PedState::Walking {
                    timer: 2.0 + rng.0.gen::<f32>() * 3.0,
                };
            }
            continue;
        };

        if pos.vec().distance(siren_pos) < TILE_SIZE * 6.0 {
            if !dodging {
                // Step perpendicular to the siren vehicle's heading, toward
                // whichever side is already further from it.
                let perp = Vec2::new(siren_angle.cos(), siren_angle.sin());
                let side = if (pos.vec() - siren_pos).dot(perp) > 0.0 {
                    1.0
                } else {
                    -1.0
                };
                let origin = pos.vec();
                ped.state = PedState::SirenDodge {
                    origin,
                    target: origin + perp * TILE_SIZE * side,
                };
            }
            if let PedState::SirenDodge { target, .. } = ped.state.clone() {
                let delta = target - pos.vec();
                let dist = delta.length();
                if dist > 2.0 {
                    let step = (DODGE_SPEED * dt).min(dist);
                    pos.x += delta.x / dist * step;
                    pos.y += delta.y / dist * step;
                }
            }
        } else if dodging {
            // Siren passed out of range.
            ped.state = PedState::Walking {
                timer: 2.0 + rng.0.gen::<f32>() * 3.0,
            };
        }
    }
}

pub fn wander_pedestrians(
    time: Res<Time>,
    grid: Res<CityGrid>,
    doors: Res<DoorRegistry>,
    construction: Res<ConstructionZone>,
    mut rng: ResMut<SimRng>,
    mut peds: Query<(&mut Pedestrian, &mut Position, Option<&Baller>), Without<Vehicle>>,
) {
    let dt = time.delta_secs();
    for (mut ped, mut pos, baller) in &mut peds {
        match ped.state.clone() {
            PedState::Walking { mut timer } => {
                step_walk(&mut ped, &mut pos, &grid, &construction, dt, &mut rng);
                timer -= dt;
                if timer > 0.0 {
                    ped.state = PedState::Walking { timer };
                } else if ped.role == Role::Civilian
                    && !doors.0.is_empty()
                    && rng.0.gen::<f32>() < DOOR_CHANCE
                {
                    let door = doors.0[rng.0.gen_range(0..doors.0.len())];
                    ped.state = PedState::GoingInside { door, timer: 15.0 };
                } else {
                    ped.state = PedState::idle(&mut rng);
                }
            }
            PedState::Idle { mut timer } => {
                if ped.role.is_stationary() {
                    continue;
                }
                // Benched ballplayers idle under the bench routine's control.
                if baller.is_some_and(|b| !b.on_court) {
                    continue;
                }
                timer -= dt;
                if timer > 0.0 {
                    ped.state = PedState::Idle { timer };
                } else {
                    ped.state = PedState::walking(&mut rng);
                    ped.pick_new_direction(&mut rng);
                }
            }
            PedState::DroppedOff { mut timer } => {
                timer -= dt;
                if timer > 0.0 {
                    ped.state = PedState::DroppedOff { timer };
                } else {
                    // Recycle back to the original spawn point.
                    pos.x = ped.spawn.x;
                    pos.y = ped.spawn.y;
                    ped.state = PedState::walking(&mut rng);
                    ped.pick_new_direction(&mut rng);
                }
            }
            PedState::GoingInside { door, mut timer } => {
                let delta = door - pos.vec();
                let dist = delta.length();
                if dist < DOOR_RADIUS {
                    ped.state = PedState::InsideBuilding {
                        door,
                        timer: INSIDE_TIME_MIN
                            + rng.0.gen::<f32>() * (INSIDE_TIME_MAX - INSIDE_TIME_MIN),
                    };
                    continue;
                }
                let step = ped.speed * 1.2 * dt;
                pos.x += delta.x / dist * step;
                pos.y += delta.y / dist * step;
                ped.direction = Direction::from_vec(delta);
                timer -= dt;
                if timer > 0.0 {
                    ped.state = PedState::GoingInside { door, timer };
                } else {
                    // Couldn't reach the door in time; give up and wander on.
                    ped.state = PedState::walking(&mut rng);
                    ped.pick_new_direction(&mut rng);
                }
            }
            PedState::InsideBuilding { door, mut timer } => {
                timer -= dt;
                if timer > 0.0 {
                    ped.state = PedState::InsideBuilding { door, timer };
                } else {
                    pos.x = door.x;
                    pos.y = door.y;
                    ped.state = PedState::walking(&mut rng);
                    ped.pick_new_direction(&mut rng);
                }
            }
            // Riding, siren dodges, lunch walkers, and the bench machine are
            // driven by their own systems.
            _ => {}
        }
    }
}

/// Advance one walking step, or re-roll the direction if the destination is
/// illegal: a solid tile, outside an assigned zone, or (for free-roaming
/// civilians) inside the construction exclusion.
fn step_walk(
    ped: &mut Pedestrian,
    pos: &mut Position,
    grid: &CityGrid,
    construction: &ConstructionZone,
    dt: f32,
    rng: &mut SimRng,
) {
    let step = ped.direction.offset() * ped.speed * dt;
    let new_x = pos.x + step.x;
    let new_y = pos.y + step.y;

    if grid.solid_at(new_x, new_y) {
        ped.pick_new_direction(rng);
        return;
    }
    if let Some(zone) = ped.zone {
        if !zone.contains(new_x, new_y) {
            ped.pick_new_direction(rng);
            return;
        }
    } else if ped.role == Role::Civilian {
        if let Some(excl) = construction.0 {
            if excl.contains(new_x, new_y) {
                ped.pick_new_direction(rng);
                return;
            }
        }
    }
    pos.x = new_x;
    pos.y = new_y;
}
