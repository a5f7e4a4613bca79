//! The lunch routine: at noon, eligible workers and suits down tools, walk to
//! a restaurant door, and walk back to their exact posts at a quarter to one.
//! A safety pass at 13:00 force-resets anyone still mid-routine.

use bevy::prelude::*;
use rand::Rng;

use crate::config::TILE_SIZE;
use crate::grid::{Direction, Position};
use crate::pedestrian::{PedState, Pedestrian, Role, SavedPost, StyleTable};
use crate::sim_rng::SimRng;
use crate::time_of_day::GameClock;
use crate::vehicle::Vehicle;

use super::RestaurantDoors;

#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    #[default]
    Normal,
    Lunch,
    Returning,
}

pub const LUNCH_HOUR: u32 = 12;
pub const LUNCH_RETURN_MINUTE: u32 = 45;
const LUNCH_WALK_SPEED: f32 = 60.0;
const ARRIVE_RADIUS: f32 = 4.0;

pub fn update_schedule(
    time: Res<Time>,
    clock: Res<GameClock>,
    styles: Res<StyleTable>,
    doors: Res<RestaurantDoors>,
    mut phase: ResMut<SchedulePhase>,
    mut rng: ResMut<SimRng>,
    mut peds: Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
) {
    let dt = time.delta_secs();
    let hour = clock.hour_of_day();
    let minute = clock.minute_of_hour();

    // Noon: head out. Guarded by phase so the edge fires once, and by >=
    // comparisons so a fast clock can't step over it.
    if *phase == SchedulePhase::Normal
        && hour == LUNCH_HOUR
        && minute < LUNCH_RETURN_MINUTE
        && !doors.0.is_empty()
    {
        *phase = SchedulePhase::Lunch;
        for (mut ped, pos) in &mut peds {
            if !takes_lunch(&ped, &styles) {
                continue;
            }
            let resume_idle = match ped.state {
                PedState::Idle { .. } => true,
                PedState::Walking { .. }
                | PedState::SirenDodge { .. }
                | PedState::GoingInside { .. } => false,
                // Riding, recovering, or already routed: leave alone.
                _ => continue,
            };
            let door = doors.0[rng.0.gen_range(0..doors.0.len())];
            let target = Vec2::new(
                door.x + (rng.0.gen::<f32>() - 0.5) * TILE_SIZE,
                door.y + TILE_SIZE,
            );
            let post = SavedPost {
                pos: pos.vec(),
                zone: ped.zone,
                resume_idle,
            };
            ped.zone = None; // free to roam to the restaurant
            ped.state = PedState::LunchGoing { target, post };
        }
    }

    // Quarter to one: everyone turns back.
    if *phase == SchedulePhase::Lunch
        && (hour > LUNCH_HOUR || (hour == LUNCH_HOUR && minute >= LUNCH_RETURN_MINUTE))
    {
        *phase = SchedulePhase::Returning;
        for (mut ped, _) in &mut peds {
            match ped.state.clone() {
                PedState::LunchGoing { post, .. } | PedState::LunchEating { post } => {
                    ped.state = PedState::LunchReturning { post };
                }
                _ => {}
            }
        }
    }

    // Straight-line walkers, both directions.
    for (mut ped, mut pos) in &mut peds {
        match ped.state.clone() {
            PedState::LunchGoing { target, post } => {
                if walk_toward(&mut pos, target, LUNCH_WALK_SPEED * dt) {
                    ped.state = PedState::LunchEating { post };
                    ped.direction = Direction::Down;
                } else {
                    ped.direction = Direction::from_vec(target - pos.vec());
                }
            }
            PedState::LunchReturning { post } => {
                if walk_toward(&mut pos, post.pos, LUNCH_WALK_SPEED * dt) {
                    restore_post(&mut ped, post, &mut rng);
                } else {
                    ped.direction = Direction::from_vec(post.pos - pos.vec());
                }
            }
            _ => {}
        }
    }

    if *phase == SchedulePhase::Returning
        && !peds
            .iter()
            .any(|(ped, _)| matches!(ped.state, PedState::LunchReturning { .. }))
    {
        *phase = SchedulePhase::Normal;
    }

    // One o'clock safety pass: anyone still mid-routine snaps home.
    if *phase != SchedulePhase::Normal && hour != LUNCH_HOUR {
        for (mut ped, mut pos) in &mut peds {
            match ped.state.clone() {
                PedState::LunchGoing { post, .. }
                | PedState::LunchEating { post }
                | PedState::LunchReturning { post } => {
                    pos.x = post.pos.x;
                    pos.y = post.pos.y;
                    restore_post(&mut ped, post, &mut rng);
                }
                _ => {}
            }
        }
        *phase = SchedulePhase::Normal;
    }
}

fn takes_lunch(ped: &Pedestrian, styles: &StyleTable) -> bool {
    match ped.role {
        Role::Construction => true,
        Role::Civilian => styles.takes_lunch(ped.style),
        _ => false,
    }
}

/// Step toward `target`; true once within the arrival radius (snapping the
/// position exactly, so returners land on their saved posts).
fn walk_toward(pos: &mut Position, target: Vec2, step: f32) -> bool {
    let delta = target - pos.vec();
    let dist = delta.length();
    if dist <= ARRIVE_RADIUS {
        pos.x = target.x;
        pos.y = target.y;
        return true;
    }
    let step = step.min(dist);
    pos.x += delta.x / dist * step;
    pos.y += delta.y / dist * step;
    false
}

fn restore_post(ped: &mut Pedestrian, post: SavedPost, rng: &mut SimRng) {
    ped.zone = post.zone;
    ped.state = if post.resume_idle {
        PedState::idle(rng)
    } else {
        PedState::walking(rng)
    };
}
