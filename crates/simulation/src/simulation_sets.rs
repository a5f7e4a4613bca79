//! Ordered phases for the `FixedUpdate` schedule.
//!
//! Configured as a chain: `Clock` → `Traffic` → `Crowd`. Traffic always steps
//! before the crowd because pedestrians read vehicle state (pickups, sirens)
//! while vehicles never read pedestrian state.

use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Tick counters and the game clock.
    Clock,
    /// Player actions, player-driven physics, AI driving, collisions.
    Traffic,
    /// Pedestrian wandering, rides, schedules, the arena game, render order.
    Crowd,
}

pub struct SimulationSetsPlugin;

impl Plugin for SimulationSetsPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Clock,
                SimulationSet::Traffic,
                SimulationSet::Crowd,
            )
                .chain(),
        );
    }
}
