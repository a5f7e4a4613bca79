//! Headless living-city simulation: a tile-grid road network with AI and
//! player-driven vehicles, a wandering pedestrian population with a ride
//! economy and daily routines, and a scripted arena game — everything the
//! host game renders but none of the rendering.
//!
//! The host adds [`SimulationPlugin`], inserts its map (`CityGrid`,
//! `RoadNetwork`, door/zone registries), runs the load-time spawners, and
//! then drives the player through [`traffic::DriveInput`] and
//! [`actions::ActionQueue`]. Each `FixedUpdate` pass is one simulation tick.

use bevy::prelude::*;

pub mod actions;
pub mod basketball;
pub mod config;
pub mod crowd;
pub mod dialogue;
pub mod grid;
pub mod pedestrian;
pub mod render_order;
pub mod roads;
pub mod sim_rng;
pub mod simulation_sets;
pub mod time_of_day;
pub mod traffic;
pub mod vehicle;
pub mod zone;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

use simulation_sets::SimulationSet;

/// Global tick counter incremented each FixedUpdate, for throttling and
/// debugging.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub fn tick_counter(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(config::SIM_HZ))
            .init_resource::<TickCounter>()
            .init_resource::<grid::CityGrid>()
            .init_resource::<roads::RoadNetwork>()
            .add_systems(FixedUpdate, tick_counter.in_set(SimulationSet::Clock));

        app.add_plugins((
            simulation_sets::SimulationSetsPlugin,
            sim_rng::SimRngPlugin,
            time_of_day::TimeOfDayPlugin,
            actions::PlayerActionsPlugin,
            traffic::TrafficPlugin,
            crowd::CrowdPlugin,
            basketball::BasketballPlugin,
            dialogue::DialoguePlugin,
            render_order::RenderOrderPlugin,
        ));
    }
}
