//! The taxi-style passenger economy: capacity-limited pickups, the drop-off
//! rectangle, and the drain-once queues the host surfaces as one-shot UI
//! events.

use bevy::prelude::*;
use rand::Rng;

use crate::grid::Position;
use crate::pedestrian::{PedState, Pedestrian, Role};
use crate::sim_rng::SimRng;
use crate::vehicle::{Vehicle, VehicleState};
use crate::zone::Zone;

use super::CrowdConfig;

/// Where delivered passengers pay out. Registered once by the host.
#[derive(Resource, Default, Debug, Clone)]
pub struct DropoffZone(pub Option<Zone>);

/// Riders are held as entity handles in this side list, never as references
/// on the vehicle, so there is no vehicle-passenger ownership cycle.
#[derive(Resource, Default, Debug)]
pub struct PassengerLedger {
    pub riders: Vec<Entity>,
    pub delivered: u32,
    pending_reward: u32,
    pending_pickups: Vec<Entity>,
}

impl PassengerLedger {
    pub fn rider_count(&self) -> usize {
        self.riders.len()
    }

    /// Drain-once: accumulated fare money to credit.
    pub fn claim_reward(&mut self) -> u32 {
        std::mem::take(&mut self.pending_reward)
    }

    /// Drain-once: pedestrians picked up since the last claim.
    pub fn claim_pickups(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.pending_pickups)
    }
}

/// A moving player-driven taxi scoops up nearby eligible civilians, silently
/// ignoring everyone once the cab is full.
pub fn scan_pickups(
    config: Res<CrowdConfig>,
    mut ledger: ResMut<PassengerLedger>,
    vehicles: Query<(&Vehicle, &Position), Without<Pedestrian>>,
    mut peds: Query<(Entity, &mut Pedestrian, &Position), Without<Vehicle>>,
) {
    let Some((taxi_pos, reach)) = vehicles
        .iter()
        .find(|(v, _)| {
            v.state == VehicleState::PlayerDriven
                && v.kind.carries_passengers()
                && v.velocity.abs() >= config.min_pickup_speed
        })
        .map(|(v, p)| {
            let profile = v.kind.profile();
            (
                p.vec(),
                config.pickup_radius + profile.width.max(profile.length) * 0.5,
            )
        })
    else {
        return;
    };

    for (entity, mut ped, pos) in &mut peds {
        if ledger.riders.len() >= config.max_passengers {
            return;
        }
        if ped.role != Role::Civilian || !ped.state.can_be_picked_up() {
            continue;
        }
        if pos.vec().distance(taxi_pos) < reach {
            ped.state = PedState::Riding;
            ledger.riders.push(entity);
            ledger.pending_pickups.push(entity);
        }
    }
}

/// Driving into the drop-off rectangle with riders aboard settles the fare:
/// everyone alights together, the ledger empties, and the reward queues up.
pub fn check_dropoff(
    config: Res<CrowdConfig>,
    zone: Res<DropoffZone>,
    mut ledger: ResMut<PassengerLedger>,
    mut rng: ResMut<SimRng>,
    vehicles: Query<(&Vehicle, &Position), Without<Pedestrian>>,
    mut peds: Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
) {
    if ledger.riders.is_empty() {
        return;
    }
    let Some(dropoff) = zone.0 else {
        return;
    };
    let Some(vehicle_pos) = vehicles
        .iter()
        .find(|(v, _)| v.state == VehicleState::PlayerDriven)
        .map(|(_, p)| p.vec())
    else {
        return;
    };
    if !dropoff.contains_vec(vehicle_pos) {
        return;
    }

    let riders: Vec<Entity> = ledger.riders.drain(..).collect();
    for &rider in &riders {
        if let Ok((mut ped, mut pos)) = peds.get_mut(rider) {
            ped.state = PedState::DroppedOff {
                timer: config.dropoff_recovery,
            };
            pos.x = vehicle_pos.x - 20.0 + rng.0.gen::<f32>() * 40.0;
            pos.y = vehicle_pos.y + 10.0 + rng.0.gen::<f32>() * 30.0;
        }
    }
    ledger.delivered += riders.len() as u32;
    ledger.pending_reward += riders.len() as u32 * config.ride_fare;
}

/// Let everyone out where the player stands — no fare. Returns the count.
/// Used when the player exits the vehicle away from the drop-off zone.
pub fn release_passengers(
    ledger: &mut PassengerLedger,
    peds: &mut Query<(&mut Pedestrian, &mut Position), Without<Vehicle>>,
    at: Vec2,
    rng: &mut SimRng,
) -> usize {
    let riders: Vec<Entity> = ledger.riders.drain(..).collect();
    for &rider in &riders {
        if let Ok((mut ped, mut pos)) = peds.get_mut(rider) {
            ped.state = PedState::Idle {
                timer: 2.0 + rng.0.gen::<f32>() * 3.0,
            };
            pos.x = at.x - 15.0 + rng.0.gen::<f32>() * 30.0;
            pos.y = at.y + 5.0 + rng.0.gen::<f32>() * 20.0;
        }
    }
    riders.len()
}
