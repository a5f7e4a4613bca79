//! Host-triggered player actions: a queue drained once per tick by an
//! executor system, with typed outcomes recorded in a drain-once log.
//! Actions that can't apply record a refusal instead of failing.

use bevy::prelude::*;
use crate::config::TILE_SIZE;
use crate::crowd::rides::{release_passengers, PassengerLedger};
use crate::grid::{CityGrid, Position};
use crate::pedestrian::Pedestrian;
use crate::sim_rng::SimRng;
use crate::simulation_sets::SimulationSet;
use crate::traffic::ai::PULLOVER_SECONDS;
use crate::traffic::solid_for_vehicle;
use crate::vehicle::{Vehicle, VehicleKind, VehicleState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    /// Enter the closest vehicle to the avatar position.
    EnterNearestVehicle { at: Vec2 },
    /// Leave the current vehicle; the outcome carries the dismount point.
    ExitVehicle,
    ToggleSiren,
    /// Order the closest AI vehicle to the curb (police only).
    PulloverNearest { at: Vec2 },
    /// Wave a pulled-over vehicle back into traffic early.
    ReleasePullover { at: Vec2 },
    /// Send the closest parked/AI vehicle speeding away.
    DismissNearest { at: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    NothingInRange,
    NotDriving,
    AlreadyDriving,
    WrongVehicle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    EnteredVehicle {
        vehicle: Entity,
    },
    /// `dismount` is where the avatar should reappear; passengers released
    /// here earn no fare.
    ExitedVehicle {
        vehicle: Entity,
        dismount: Vec2,
        released_passengers: usize,
    },
    SirenToggled {
        on: bool,
    },
    PulledOver {
        vehicle: Entity,
    },
    PulloverReleased {
        vehicle: Entity,
    },
    Dismissed {
        vehicle: Entity,
    },
    Refused {
        reason: RefusalReason,
    },
}

#[derive(Resource, Default, Debug)]
pub struct ActionQueue {
    pending: Vec<PlayerAction>,
}

impl ActionQueue {
    pub fn push(&mut self, action: PlayerAction) {
        self.pending.push(action);
    }

    pub fn drain(&mut self) -> Vec<PlayerAction> {
        self.pending.drain(..).collect()
    }
}

#[derive(Resource, Default, Debug)]
pub struct ActionLog {
    entries: Vec<ActionOutcome>,
}

impl ActionLog {
    fn push(&mut self, outcome: ActionOutcome) {
        self.entries.push(outcome);
    }

    /// Drain-once: outcomes recorded since the last claim.
    pub fn claim(&mut self) -> Vec<ActionOutcome> {
        std::mem::take(&mut self.entries)
    }
}

// ---------------------------------------------------------------------------
// Nearest-vehicle queries (linear scans; the fleet is small)
// ---------------------------------------------------------------------------

fn nearest_matching<'a>(
    vehicles: impl IntoIterator<Item = (Entity, &'a Vehicle, &'a Position)>,
    at: Vec2,
    max_dist: f32,
    mut accept: impl FnMut(&Vehicle) -> bool,
) -> Option<(Entity, f32)> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, vehicle, pos) in vehicles {
        if !accept(vehicle) {
            continue;
        }
        let dist = pos.distance_to(at);
        if dist < best.map_or(max_dist, |(_, d)| d) {
            best = Some((entity, dist));
        }
    }
    best
}

/// Closest vehicle the player could enter (anything not already driven).
pub fn find_nearest_enterable<'a>(
    vehicles: impl IntoIterator<Item = (Entity, &'a Vehicle, &'a Position)>,
    at: Vec2,
    max_dist: f32,
) -> Option<(Entity, f32)> {
    nearest_matching(vehicles, at, max_dist, |v| {
        v.state != VehicleState::PlayerDriven
    })
}

/// Closest AI (or already pulled-over) vehicle a police driver can stop.
pub fn find_nearest_pullover<'a>(
    vehicles: impl IntoIterator<Item = (Entity, &'a Vehicle, &'a Position)>,
    at: Vec2,
    max_dist: f32,
) -> Option<(Entity, f32)> {
    nearest_matching(vehicles, at, max_dist, |v| {
        matches!(v.state, VehicleState::Ai | VehicleState::PulledOver)
    })
}

/// Closest dismissable vehicle. Emergency vehicles won't be shooed away.
pub fn find_nearest_dismissable<'a>(
    vehicles: impl IntoIterator<Item = (Entity, &'a Vehicle, &'a Position)>,
    at: Vec2,
    max_dist: f32,
) -> Option<(Entity, f32)> {
    nearest_matching(vehicles, at, max_dist, |v| {
        matches!(v.state, VehicleState::Ai | VehicleState::Parked) && !v.kind.is_emergency()
    })
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub fn execute_player_actions(
    mut queue: ResMut<ActionQueue>,
    mut log: ResMut<ActionLog>,
    grid: Res<CityGrid>,
    mut ledger: ResMut<PassengerLedger>,
    mut rng: ResMut<SimRng>,
    mut vehicles: Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>,
    mut peds: Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
) {
    for action in queue.drain() {
        let outcome = match action {
            PlayerAction::EnterNearestVehicle { at } => enter_nearest(at, &mut vehicles),
            PlayerAction::ExitVehicle => {
                exit_vehicle(&grid, &mut ledger, &mut rng, &mut vehicles, &mut peds)
            }
            PlayerAction::ToggleSiren => toggle_siren(&mut vehicles),
            PlayerAction::PulloverNearest { at } => pullover_nearest(at, &mut vehicles),
            PlayerAction::ReleasePullover { at } => release_pullover(at, &mut vehicles),
            PlayerAction::DismissNearest { at } => dismiss_nearest(at, &mut vehicles),
        };
        log.push(outcome);
    }
}

fn player_entity(vehicles: &Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> Option<Entity> {
    vehicles
        .iter()
        .find(|(_, v, _)| v.state == VehicleState::PlayerDriven)
        .map(|(e, _, _)| e)
}

fn enter_nearest(at: Vec2, vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> ActionOutcome {
    if player_entity(vehicles).is_some() {
        return ActionOutcome::Refused {
            reason: RefusalReason::AlreadyDriving,
        };
    }
    let found = find_nearest_enterable(
        vehicles.iter(),
        at,
        TILE_SIZE * 2.0,
    );
    let Some((entity, _)) = found else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NothingInRange,
        };
    };
    if let Ok((_, mut vehicle, _)) = vehicles.get_mut(entity) {
        vehicle.state = VehicleState::PlayerDriven;
        vehicle.velocity = 0.0;
        vehicle.angle = vehicle.direction.angle();
    }
    ActionOutcome::EnteredVehicle { vehicle: entity }
}

fn exit_vehicle(
    grid: &CityGrid,
    ledger: &mut PassengerLedger,
    rng: &mut SimRng,
    vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>,
    peds: &mut Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
) -> ActionOutcome {
    let Some(entity) = player_entity(vehicles) else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NotDriving,
        };
    };
    let Ok((_, mut vehicle, pos)) = vehicles.get_mut(entity) else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NotDriving,
        };
    };

    // Probe left of the vehicle, then right, then behind; the last candidate
    // stands even if blocked (the host clamps the avatar anyway).
    let exit_dist = TILE_SIZE * 1.2;
    let mut dismount = Vec2::ZERO;
    for offset in [
        -std::f32::consts::FRAC_PI_2,
        std::f32::consts::FRAC_PI_2,
        std::f32::consts::PI,
    ] {
        let a = vehicle.angle + offset;
        dismount = Vec2::new(pos.x + a.sin() * exit_dist, pos.y - a.cos() * exit_dist);
        if !solid_for_vehicle(grid, dismount.x, dismount.y, 8.0) {
            break;
        }
    }

    vehicle.state = VehicleState::Parked;
    vehicle.velocity = 0.0;
    vehicle.siren_on = false;

    let released = release_passengers(ledger, peds, dismount, rng);
    ActionOutcome::ExitedVehicle {
        vehicle: entity,
        dismount,
        released_passengers: released,
    }
}

fn toggle_siren(vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> ActionOutcome {
    let Some(entity) = player_entity(vehicles) else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NotDriving,
        };
    };
    let Ok((_, mut vehicle, _)) = vehicles.get_mut(entity) else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NotDriving,
        };
    };
    if !vehicle.kind.profile().has_lights {
        return ActionOutcome::Refused {
            reason: RefusalReason::WrongVehicle,
        };
    }
    vehicle.siren_on = !vehicle.siren_on;
    ActionOutcome::SirenToggled {
        on: vehicle.siren_on,
    }
}

fn pullover_nearest(at: Vec2, vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> ActionOutcome {
    // Only a police driver gets to order anyone to the curb.
    let driving_police = vehicles
        .iter()
        .any(|(_, v, _)| v.state == VehicleState::PlayerDriven && v.kind == VehicleKind::Police);
    if !driving_police {
        return ActionOutcome::Refused {
            reason: RefusalReason::WrongVehicle,
        };
    }
    let found = find_nearest_pullover(
        vehicles.iter(),
        at,
        TILE_SIZE * 3.0,
    );
    let Some((entity, _)) = found else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NothingInRange,
        };
    };
    if let Ok((_, mut vehicle, _)) = vehicles.get_mut(entity) {
        vehicle.state = VehicleState::PulledOver;
        vehicle.current_speed = 0.0;
        vehicle.pulled_over_timer = PULLOVER_SECONDS;
    }
    ActionOutcome::PulledOver { vehicle: entity }
}

fn release_pullover(at: Vec2, vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> ActionOutcome {
    let found = nearest_matching(
        vehicles.iter(),
        at,
        TILE_SIZE * 3.0,
        |v| v.state == VehicleState::PulledOver,
    );
    let Some((entity, _)) = found else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NothingInRange,
        };
    };
    if let Ok((_, mut vehicle, _)) = vehicles.get_mut(entity) {
        vehicle.state = VehicleState::Ai;
        vehicle.current_speed = vehicle.ai_speed;
        vehicle.pulled_over_timer = 0.0;
    }
    ActionOutcome::PulloverReleased { vehicle: entity }
}

fn dismiss_nearest(at: Vec2, vehicles: &mut Query<(Entity, &mut Vehicle, &mut Position), Without<Pedestrian>>) -> ActionOutcome {
    let found = find_nearest_dismissable(
        vehicles.iter(),
        at,
        TILE_SIZE * 2.5,
    );
    let Some((entity, _)) = found else {
        return ActionOutcome::Refused {
            reason: RefusalReason::NothingInRange,
        };
    };
    if let Ok((_, mut vehicle, _)) = vehicles.get_mut(entity) {
        // Speed it up and send it away; it respawns at a map edge later.
        vehicle.state = VehicleState::Ai;
        vehicle.ai_speed = vehicle.kind.profile().cruise_speed * 2.0;
        vehicle.current_speed = vehicle.ai_speed;
    }
    ActionOutcome::Dismissed { vehicle: entity }
}

pub struct PlayerActionsPlugin;

impl Plugin for PlayerActionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionQueue>()
            .init_resource::<ActionLog>()
            .add_systems(
                FixedUpdate,
                execute_player_actions
                    .in_set(SimulationSet::Traffic)
                    .before(crate::traffic::player::player_drive),
            );
    }
}
