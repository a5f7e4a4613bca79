//! Depth-sorted draw order, rebuilt every tick. The simulation owns the sort
//! key; drawing itself is the host renderer's problem.

use bevy::prelude::*;

use crate::grid::Position;
use crate::pedestrian::Pedestrian;
use crate::simulation_sets::SimulationSet;
use crate::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Vehicle,
    Pedestrian,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderEntry {
    pub entity: Entity,
    pub kind: RenderKind,
    /// World-pixel y of the entity's visual base; draw in ascending order.
    pub sort_y: f32,
}

/// All drawable entities in back-to-front order. Riding and inside-building
/// pedestrians are absent entirely.
#[derive(Resource, Default, Debug)]
pub struct RenderQueue {
    pub entries: Vec<RenderEntry>,
}

pub fn collect_render_entries(
    mut queue: ResMut<RenderQueue>,
    vehicles: Query<(Entity, &Vehicle, &Position), Without<Pedestrian>>,
    peds: Query<(Entity, &Pedestrian, &Position), Without<Vehicle>>,
) {
    queue.entries.clear();
    for (entity, vehicle, pos) in &vehicles {
        queue.entries.push(RenderEntry {
            entity,
            kind: RenderKind::Vehicle,
            sort_y: pos.y + vehicle.sort_y_offset(),
        });
    }
    for (entity, ped, pos) in &peds {
        if !ped.state.is_visible() {
            continue;
        }
        queue.entries.push(RenderEntry {
            entity,
            kind: RenderKind::Pedestrian,
            sort_y: pos.y + ped.sort_y_offset(),
        });
    }
    queue
        .entries
        .sort_by(|a, b| a.sort_y.partial_cmp(&b.sort_y).unwrap_or(std::cmp::Ordering::Equal));
}

pub struct RenderOrderPlugin;

impl Plugin for RenderOrderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RenderQueue>().add_systems(
            FixedUpdate,
            collect_render_entries
                .in_set(SimulationSet::Crowd)
                .after(crate::crowd::rides::check_dropoff)
                .after(crate::basketball::bench_routines),
        );
    }
}
