use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::sim_rng::SimRng;

/// Static handling/size profile for one vehicle kind. Speeds in px/s, turn
/// rate in rad/s.
#[derive(Debug, Clone, Copy)]
pub struct VehicleProfile {
    pub name: &'static str,
    pub width: f32,
    pub length: f32,
    /// AI cruise speed before the per-vehicle 0.9-1.1x roll.
    pub cruise_speed: f32,
    pub max_player_speed: f32,
    pub acceleration: f32,
    pub braking: f32,
    pub friction: f32,
    pub turn_speed: f32,
    pub has_lights: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Police,
    FireTruck,
    GarbageTruck,
    Ambulance,
    Sedan,
    Suv,
    Van,
    PickupTruck,
    Taxi,
    SportsCar,
    ConstructionTruck,
    Excavator,
}

impl VehicleKind {
    /// Kinds spawned as ambient road traffic.
    pub const CASUAL: [VehicleKind; 5] = [
        VehicleKind::Sedan,
        VehicleKind::Suv,
        VehicleKind::Taxi,
        VehicleKind::Van,
        VehicleKind::PickupTruck,
    ];

    pub fn profile(self) -> &'static VehicleProfile {
        match self {
            VehicleKind::Police => &VehicleProfile {
                name: "Police Car",
                width: 18.0,
                length: 30.0,
                cruise_speed: 90.0,
                max_player_speed: 200.0,
                acceleration: 160.0,
                braking: 250.0,
                friction: 80.0,
                turn_speed: 2.8,
                has_lights: true,
            },
            VehicleKind::FireTruck => &VehicleProfile {
                name: "Fire Truck",
                width: 20.0,
                length: 44.0,
                cruise_speed: 70.0,
                max_player_speed: 150.0,
                acceleration: 100.0,
                braking: 200.0,
                friction: 70.0,
                turn_speed: 2.0,
                has_lights: true,
            },
            VehicleKind::GarbageTruck => &VehicleProfile {
                name: "Garbage Truck",
                width: 22.0,
                length: 38.0,
                cruise_speed: 50.0,
                max_player_speed: 120.0,
                acceleration: 80.0,
                braking: 180.0,
                friction: 90.0,
                turn_speed: 2.2,
                has_lights: false,
            },
            VehicleKind::Ambulance => &VehicleProfile {
                name: "Ambulance",
                width: 18.0,
                length: 34.0,
                cruise_speed: 100.0,
                max_player_speed: 220.0,
                acceleration: 180.0,
                braking: 280.0,
                friction: 80.0,
                turn_speed: 2.6,
                has_lights: true,
            },
            VehicleKind::Sedan => &VehicleProfile {
                name: "Sedan",
                width: 16.0,
                length: 28.0,
                cruise_speed: 80.0,
                max_player_speed: 180.0,
                acceleration: 140.0,
                braking: 220.0,
                friction: 80.0,
                turn_speed: 3.0,
                has_lights: false,
            },
            VehicleKind::Suv => &VehicleProfile {
                name: "SUV",
                width: 20.0,
                length: 32.0,
                cruise_speed: 75.0,
                max_player_speed: 170.0,
                acceleration: 120.0,
                braking: 200.0,
                friction: 85.0,
                turn_speed: 2.5,
                has_lights: false,
            },
            VehicleKind::Van => &VehicleProfile {
                name: "Van",
                width: 20.0,
                length: 36.0,
                cruise_speed: 65.0,
                max_player_speed: 140.0,
                acceleration: 100.0,
                braking: 190.0,
                friction: 90.0,
                turn_speed: 2.3,
                has_lights: false,
            },
            VehicleKind::PickupTruck => &VehicleProfile {
                name: "Pickup Truck",
                width: 18.0,
                length: 32.0,
                cruise_speed: 70.0,
                max_player_speed: 160.0,
                acceleration: 110.0,
                braking: 200.0,
                friction: 80.0,
                turn_speed: 2.6,
                has_lights: false,
            },
            VehicleKind::Taxi => &VehicleProfile {
                name: "Taxi",
                width: 16.0,
                length: 28.0,
                cruise_speed: 85.0,
                max_player_speed: 190.0,
                acceleration: 150.0,
                braking: 230.0,
                friction: 80.0,
                turn_speed: 3.0,
                has_lights: false,
            },
            VehicleKind::SportsCar => &VehicleProfile {
                name: "Sports Car",
                width: 16.0,
                length: 26.0,
                cruise_speed: 110.0,
                max_player_speed: 260.0,
                acceleration: 220.0,
                braking: 300.0,
                friction: 70.0,
                turn_speed: 3.2,
                has_lights: false,
            },
            VehicleKind::ConstructionTruck => &VehicleProfile {
                name: "Construction Truck",
                width: 20.0,
                length: 48.0,
                cruise_speed: 55.0,
                max_player_speed: 120.0,
                acceleration: 80.0,
                braking: 160.0,
                friction: 70.0,
                turn_speed: 1.8,
                has_lights: false,
            },
            VehicleKind::Excavator => &VehicleProfile {
                name: "Excavator",
                width: 24.0,
                length: 30.0,
                cruise_speed: 30.0,
                max_player_speed: 60.0,
                acceleration: 40.0,
                braking: 80.0,
                friction: 60.0,
                turn_speed: 1.5,
                has_lights: false,
            },
        }
    }

    /// Emergency vehicles can't be dismissed and may run a siren.
    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            VehicleKind::Police | VehicleKind::FireTruck | VehicleKind::Ambulance
        )
    }

    /// Only this category picks up fare passengers.
    pub fn carries_passengers(self) -> bool {
        matches!(self, VehicleKind::Taxi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleState {
    Ai,
    Parked,
    PlayerDriven,
    PulledOver,
}

const DRIVER_NAMES: &[&str] = &[
    "Jake", "Maria", "Tyler", "Sophia", "Derek", "Nina", "Carlos", "Jasmine", "Brandon", "Ashley",
    "Marcus", "Lena", "Kevin", "Rosa", "Travis", "Kim", "Danny", "Olivia", "Rick", "Tanya", "Pete",
    "Angela", "Ray", "Megan",
];

/// One car. Kinematics plus the driving-mode state machine; the world-pixel
/// center lives in the shared `Position` component.
#[derive(Component, Debug, Clone)]
pub struct Vehicle {
    pub kind: VehicleKind,
    pub direction: Direction,
    /// Continuous heading, used while player-driven.
    pub angle: f32,
    /// Signed player-physics speed in px/s (negative = reverse).
    pub velocity: f32,
    /// Nominal AI speed, rolled per vehicle around the profile cruise speed.
    pub ai_speed: f32,
    /// Instantaneous AI speed after car-following adjustments.
    pub current_speed: f32,
    pub state: VehicleState,
    pub siren_on: bool,
    pub driver_name: &'static str,
    /// Seconds until a pulled-over vehicle resumes driving.
    pub pulled_over_timer: f32,
    /// Intersection-cell dedup key so a multi-tile crossing is decided once.
    pub last_intersection: Option<(i32, i32)>,
    /// Pre-dodge origin while yielding to a siren.
    pub siren_refuge: Option<Vec2>,
}

impl Vehicle {
    pub fn new(kind: VehicleKind, direction: Direction, state: VehicleState, rng: &mut SimRng) -> Self {
        let profile = kind.profile();
        let ai_speed = profile.cruise_speed * (0.9 + rng.0.gen::<f32>() * 0.2);
        Self {
            kind,
            direction,
            angle: direction.angle(),
            velocity: 0.0,
            ai_speed,
            current_speed: if state == VehicleState::Ai { ai_speed } else { 0.0 },
            state,
            siren_on: false,
            driver_name: DRIVER_NAMES[rng.0.gen_range(0..DRIVER_NAMES.len())],
            pulled_over_timer: 0.0,
            last_intersection: None,
            siren_refuge: None,
        }
    }

    /// Fresh nominal speed roll, used on soft respawn.
    pub fn reroll_speed(&mut self, rng: &mut SimRng) {
        self.ai_speed = self.kind.profile().cruise_speed * (0.9 + rng.0.gen::<f32>() * 0.2);
    }

    /// Circular footprint for tile collision, with 2px of forgiveness.
    pub fn collision_radius(&self) -> f32 {
        let p = self.kind.profile();
        p.width.max(p.length) * 0.5 - 2.0
    }

    /// Heading used for drawing: continuous while player-driven, otherwise
    /// snapped to the discrete direction.
    pub fn render_angle(&self) -> f32 {
        if self.state == VehicleState::PlayerDriven {
            self.angle
        } else {
            self.direction.angle()
        }
    }

    /// Depth-sort key offset: distance from center to the footprint bottom at
    /// the current heading. Add to the vehicle's y position.
    pub fn sort_y_offset(&self) -> f32 {
        let p = self.kind.profile();
        let a = self.render_angle();
        a.cos().abs() * p.length * 0.5 + a.sin().abs() * p.width * 0.5
    }
}
