//! The pedestrian population: wandering, rides, schedules, and the
//! load-time spawners for every crew the map asks for.

pub mod rides;
pub mod schedule;
pub mod wander;

#[cfg(test)]
mod tests;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position, TileKind};
use crate::pedestrian::{PedState, Pedestrian, Role};
use crate::sim_rng::SimRng;
use crate::simulation_sets::SimulationSet;
use crate::zone::Zone;

/// Building door positions civilians may wander into. Registered by the host
/// once the building list is loaded, and extended when doors unlock.
#[derive(Resource, Default, Debug, Clone)]
pub struct DoorRegistry(pub Vec<Vec2>);

/// Restaurant doors used by the lunch routine.
#[derive(Resource, Default, Debug, Clone)]
pub struct RestaurantDoors(pub Vec<Vec2>);

/// Exclusion rectangle that keeps unzoned civilians off the work site.
#[derive(Resource, Default, Debug, Clone)]
pub struct ConstructionZone(pub Option<Zone>);

/// Tunables for the crowd, loadable by the host.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct CrowdConfig {
    /// Base pickup radius in pixels; the taxi footprint is added on top.
    pub pickup_radius: f32,
    /// Minimum |velocity| for a pickup, px/s.
    pub min_pickup_speed: f32,
    pub max_passengers: usize,
    /// Dollars credited per passenger delivered to the drop-off zone.
    pub ride_fare: u32,
    /// Seconds a dropped-off pedestrian lingers before respawning at home.
    pub dropoff_recovery: f32,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            pickup_radius: 18.0,
            min_pickup_speed: 15.0,
            max_passengers: 4,
            ride_fare: 50,
            dropoff_recovery: 8.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Load-time spawners
// ---------------------------------------------------------------------------

/// Scatter `count` civilians over random sidewalk tiles (2-tile map margin).
pub fn spawn_civilians(
    commands: &mut Commands,
    grid: &CityGrid,
    rng: &mut SimRng,
    count: usize,
) {
    let mut spots = Vec::new();
    for row in 2..grid.height.saturating_sub(2) {
        for col in 2..grid.width.saturating_sub(2) {
            if grid.get(col, row) == TileKind::Sidewalk {
                spots.push((col, row));
            }
        }
    }
    if spots.is_empty() {
        warn!("no sidewalk tiles to spawn civilians on");
        return;
    }
    for i in 0..count {
        let (col, row) = spots[rng.0.gen_range(0..spots.len())];
        let center = CityGrid::tile_to_world(col, row);
        let jitter = Vec2::new(rng.0.gen::<f32>() * 4.0, rng.0.gen::<f32>() * 4.0);
        let spawn = center + jitter;
        let speed = 40.0 * (0.7 + rng.0.gen::<f32>() * 0.6);
        commands.spawn((
            Pedestrian::new(Role::Civilian, i, spawn, speed, rng),
            Position::new(spawn.x, spawn.y),
        ));
    }
    info!("spawned {count} civilians");
}

/// Inclusive tile rectangle of the stadium field plus its sideline row.
#[derive(Debug, Clone, Copy)]
pub struct StadiumLayout {
    pub field_cols: (usize, usize),
    pub field_rows: (usize, usize),
    pub sideline_row: usize,
}

/// Football squad, security detail, referees, and a coach rooted to the
/// sideline. All zone-locked wanderers except the coach.
pub fn spawn_stadium_crew(commands: &mut Commands, layout: &StadiumLayout, rng: &mut SimRng) {
    let field = Zone::from_tiles(layout.field_cols, layout.field_rows, 8.0);
    for i in 0..6 {
        let x = field.x1 + 8.0 + rng.0.gen::<f32>() * (field.x2 - field.x1 - 32.0);
        let y = field.y1 + 8.0 + rng.0.gen::<f32>() * (field.y2 - field.y1 - 32.0);
        let spawn = Vec2::new(x, y);
        let speed = 60.0 + rng.0.gen::<f32>() * 30.0;
        let mut ped = Pedestrian::new(Role::FootballPlayer, i, spawn, speed, rng);
        ped.zone = Some(field);
        commands.spawn((ped, Position::new(spawn.x, spawn.y)));
    }

    // The star of the team starts dead center.
    let star_spawn = field.center();
    let mut star = Pedestrian::new(
        Role::StarPlayer,
        0,
        star_spawn,
        50.0 + rng.0.gen::<f32>() * 20.0,
        rng,
    );
    star.zone = Some(field);
    commands.spawn((star, Position::new(star_spawn.x, star_spawn.y)));

    let apron = Zone::from_tiles_padded(layout.field_cols, layout.field_rows, TILE_SIZE);
    let guard_posts = [
        Vec2::new(
            (layout.field_cols.0 as f32 - 1.0) * TILE_SIZE + 8.0,
            layout.sideline_row as f32 * TILE_SIZE + 8.0,
        ),
        Vec2::new(
            (layout.field_cols.1 as f32 + 1.0) * TILE_SIZE + 8.0,
            layout.sideline_row as f32 * TILE_SIZE + 8.0,
        ),
        Vec2::new(
            (layout.field_cols.0 as f32 - 1.0) * TILE_SIZE + 8.0,
            (layout.field_rows.1 as f32 + 1.0) * TILE_SIZE + 8.0,
        ),
        Vec2::new(
            (layout.field_cols.1 as f32 + 1.0) * TILE_SIZE + 8.0,
            (layout.field_rows.1 as f32 + 1.0) * TILE_SIZE + 8.0,
        ),
    ];
    for (i, &post) in guard_posts.iter().enumerate() {
        let mut guard =
            Pedestrian::new(Role::Security, i, post, 30.0 + rng.0.gen::<f32>() * 10.0, rng);
        guard.zone = Some(apron);
        commands.spawn((guard, Position::new(post.x, post.y)));
    }

    for i in 0..2 {
        let x = field.x1 + 30.0 + i as f32 * ((field.x2 - field.x1) * 0.5 - 40.0);
        let y = field.y1 + 30.0 + i as f32 * ((field.y2 - field.y1) * 0.5 - 40.0);
        let spawn = Vec2::new(x, y);
        let mut referee =
            Pedestrian::new(Role::Referee, i, spawn, 40.0 + rng.0.gen::<f32>() * 15.0, rng);
        referee.zone = Some(field);
        commands.spawn((referee, Position::new(spawn.x, spawn.y)));
    }

    let coach_spawn = Vec2::new(
        (layout.field_cols.0 as f32 - 1.0) * TILE_SIZE + 8.0,
        (layout.field_rows.0 + layout.field_rows.1) as f32 * 0.5 * TILE_SIZE,
    );
    let mut coach = Pedestrian::new(Role::Coach, 0, coach_spawn, 30.0, rng);
    coach.state = PedState::idle_forever();
    coach.direction = Direction::Right; // facing the field
    commands.spawn((coach, Position::new(coach_spawn.x, coach_spawn.y)));
}

/// Construction site rectangle with an optional keep-out patch (break room).
#[derive(Debug, Clone, Copy)]
pub struct ConstructionSite {
    pub cols: (usize, usize),
    pub rows: (usize, usize),
    pub exclusion: Option<Zone>,
}

/// Four workers zone-locked to the site, spawned clear of the exclusion.
pub fn spawn_construction_crew(commands: &mut Commands, site: &ConstructionSite, rng: &mut SimRng) {
    let zone = Zone::from_tiles(site.cols, site.rows, 8.0);
    for i in 0..4 {
        let mut spawn = zone.center();
        for _ in 0..20 {
            let x = zone.x1 + 12.0 + rng.0.gen::<f32>() * (zone.x2 - zone.x1 - 42.0);
            let y = zone.y1 + 12.0 + rng.0.gen::<f32>() * (zone.y2 - zone.y1 - 42.0);
            spawn = Vec2::new(x, y);
            if site.exclusion.is_none_or(|excl| !excl.contains_vec(spawn)) {
                break;
            }
        }
        let speed = 25.0 + rng.0.gen::<f32>() * 15.0;
        let mut worker = Pedestrian::new(Role::Construction, i, spawn, speed, rng);
        worker.zone = Some(zone);
        commands.spawn((worker, Position::new(spawn.x, spawn.y)));
    }
}

/// Road-work patch: three slow workers confined to the dug-up strip.
pub fn spawn_road_workers(
    commands: &mut Commands,
    cols: (usize, usize),
    rows: (usize, usize),
    rng: &mut SimRng,
) {
    let zone = Zone::from_tiles(cols, rows, 6.0);
    for i in 0..3 {
        let x = zone.x1 + 10.0 + rng.0.gen::<f32>() * (zone.x2 - zone.x1 - 24.0);
        let y = zone.y1 + 4.0 + rng.0.gen::<f32>() * (zone.y2 - zone.y1 - 12.0);
        let spawn = Vec2::new(x, y);
        let speed = 15.0 + rng.0.gen::<f32>() * 10.0;
        let mut worker = Pedestrian::new(Role::Construction, i, spawn, speed, rng);
        worker.zone = Some(zone);
        commands.spawn((worker, Position::new(spawn.x, spawn.y)));
    }
}

/// The garbage-yard foreman stands at a post and never wanders off.
pub fn spawn_garbage_foreman(
    commands: &mut Commands,
    yard_cols: (usize, usize),
    yard_rows: (usize, usize),
    post: (usize, usize),
    rng: &mut SimRng,
) {
    let spawn = CityGrid::tile_to_world(post.0, post.1);
    let mut foreman = Pedestrian::new(Role::GarbageWorker, 0, spawn, 25.0, rng);
    foreman.state = PedState::idle_forever();
    foreman.direction = Direction::Down;
    foreman.zone = Some(Zone::from_tiles(yard_cols, yard_rows, 8.0));
    commands.spawn((foreman, Position::new(spawn.x, spawn.y)));
}

/// Inmates pacing a cell block or yard.
pub fn spawn_prisoners(commands: &mut Commands, yard: Zone, count: usize, rng: &mut SimRng) {
    for i in 0..count {
        let x = yard.x1 + rng.0.gen::<f32>() * (yard.x2 - yard.x1);
        let y = yard.y1 + rng.0.gen::<f32>() * (yard.y2 - yard.y1);
        let spawn = Vec2::new(x, y);
        let speed = 20.0 + rng.0.gen::<f32>() * 15.0;
        let mut inmate = Pedestrian::new(Role::Prisoner, i, spawn, speed, rng);
        inmate.zone = Some(yard);
        commands.spawn((inmate, Position::new(spawn.x, spawn.y)));
    }
}

pub struct CrowdPlugin;

impl Plugin for CrowdPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DoorRegistry>()
            .init_resource::<RestaurantDoors>()
            .init_resource::<ConstructionZone>()
            .init_resource::<CrowdConfig>()
            .init_resource::<crate::pedestrian::StyleTable>()
            .init_resource::<rides::DropoffZone>()
            .init_resource::<rides::PassengerLedger>()
            .init_resource::<schedule::SchedulePhase>()
            .add_systems(
                FixedUpdate,
                (
                    schedule::update_schedule,
                    wander::siren_dodge,
                    wander::wander_pedestrians,
                    rides::scan_pickups,
                    rides::check_dropoff,
                )
                    .chain()
                    .in_set(SimulationSet::Crowd),
            );
    }
}
