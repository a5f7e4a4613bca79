//! Headless integration-test harness: a fluent builder around
//! `bevy::app::App` + [`SimulationPlugin`] for driving the simulation without
//! a window or renderer.

use bevy::app::App;
use bevy::prelude::*;

use crate::actions::PlayerAction;
use crate::basketball::{spawn_basketball_crowd, BasketballGame, CourtLayout};
use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position, TileKind};
use crate::pedestrian::{Pedestrian, Role};
use crate::roads::RoadNetwork;
use crate::sim_rng::SimRng;
use crate::time_of_day::GameClock;
use crate::traffic::DriveInput;
use crate::vehicle::{Vehicle, VehicleKind, VehicleState};
use crate::zone::Zone;

/// A headless town wrapping `SimulationPlugin` for tests and benches.
///
/// Build the map with the painting methods, call `rebuild_roads()`, spawn
/// actors, then `tick()` to advance and assert on the resulting state.
pub struct TestTown {
    pub app: App,
}

impl TestTown {
    /// An all-grass town of the given tile dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(crate::SimulationPlugin);
        app.insert_resource(CityGrid::new(width, height));
        app.insert_resource(SimRng::from_seed_u64(1234));
        // Run once so startup work settles before the first tick.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Map painting (builder pattern)
    // -----------------------------------------------------------------------

    pub fn paint_row(mut self, row: usize, kind: TileKind) -> Self {
        let mut grid = self.app.world_mut().resource_mut::<CityGrid>();
        for col in 0..grid.width {
            grid.set(col, row, kind);
        }
        self
    }

    pub fn paint_col(mut self, col: usize, kind: TileKind) -> Self {
        let mut grid = self.app.world_mut().resource_mut::<CityGrid>();
        for row in 0..grid.height {
            grid.set(col, row, kind);
        }
        self
    }

    pub fn paint_tile(mut self, col: usize, row: usize, kind: TileKind) -> Self {
        let mut grid = self.app.world_mut().resource_mut::<CityGrid>();
        grid.set(col, row, kind);
        self
    }

    /// Derive the lane network from the painted grid.
    pub fn rebuild_roads(mut self) -> Self {
        let network = {
            let grid = self.app.world().resource::<CityGrid>();
            RoadNetwork::from_grid(grid)
        };
        self.app.insert_resource(network);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.app.insert_resource(SimRng::from_seed_u64(seed));
        self
    }

    pub fn with_dropoff_zone(mut self, zone: Zone) -> Self {
        self.app
            .insert_resource(crate::crowd::rides::DropoffZone(Some(zone)));
        self
    }

    pub fn with_doors(mut self, doors: Vec<Vec2>) -> Self {
        self.app.insert_resource(crate::crowd::DoorRegistry(doors));
        self
    }

    pub fn with_restaurant_doors(mut self, doors: Vec<Vec2>) -> Self {
        self.app
            .insert_resource(crate::crowd::RestaurantDoors(doors));
        self
    }

    pub fn with_construction_zone(mut self, zone: Zone) -> Self {
        self.app
            .insert_resource(crate::crowd::ConstructionZone(Some(zone)));
        self
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    pub fn spawn_vehicle(
        &mut self,
        kind: VehicleKind,
        dir: Direction,
        state: VehicleState,
        x: f32,
        y: f32,
    ) -> Entity {
        let vehicle = {
            let mut rng = self.app.world_mut().resource_mut::<SimRng>();
            Vehicle::new(kind, dir, state, &mut rng)
        };
        self.app
            .world_mut()
            .spawn((vehicle, Position::new(x, y)))
            .id()
    }

    pub fn spawn_pedestrian(&mut self, role: Role, x: f32, y: f32) -> Entity {
        let ped = {
            let mut rng = self.app.world_mut().resource_mut::<SimRng>();
            Pedestrian::new(role, 0, Vec2::new(x, y), 40.0, &mut rng)
        };
        self.app.world_mut().spawn((ped, Position::new(x, y))).id()
    }

    pub fn spawn_basketball(&mut self, layout: CourtLayout) {
        self.app.insert_resource(layout);
        let world = self.app.world_mut();
        world.resource_scope(|world, mut game: Mut<BasketballGame>| {
            world.resource_scope(|world, mut rng: Mut<SimRng>| {
                let mut commands_queue = bevy::ecs::world::CommandQueue::default();
                let mut commands = Commands::new(&mut commands_queue, world);
                spawn_basketball_crowd(&mut commands, &layout, &mut game, &mut rng);
                commands_queue.apply(world);
            });
        });
    }

    // -----------------------------------------------------------------------
    // Driving the simulation
    // -----------------------------------------------------------------------

    /// Advance `n` fixed ticks (100 ms each).
    pub fn tick(&mut self, n: u32) {
        let dt = std::time::Duration::from_millis(100);
        // Drive time deterministically: each `update()` advances the clock by
        // exactly one fixed period so precisely one `FixedUpdate` pass runs.
        self.app
            .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(dt));
        for _ in 0..n {
            self.app.update();
        }
    }

    pub fn set_drive_input(&mut self, throttle: f32, steer: f32) {
        self.app
            .insert_resource(DriveInput { throttle, steer });
    }

    pub fn queue_action(&mut self, action: PlayerAction) {
        self.app
            .world_mut()
            .resource_mut::<crate::actions::ActionQueue>()
            .push(action);
    }

    /// Jump the clock to a minutes-of-day value.
    pub fn set_clock_minutes(&mut self, minutes: f32) {
        self.app.world_mut().resource_mut::<GameClock>().minutes = minutes;
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    pub fn vehicle(&self, entity: Entity) -> Vehicle {
        self.app
            .world()
            .get::<Vehicle>(entity)
            .expect("entity should have a Vehicle")
            .clone()
    }

    pub fn pedestrian(&self, entity: Entity) -> Pedestrian {
        self.app
            .world()
            .get::<Pedestrian>(entity)
            .expect("entity should have a Pedestrian")
            .clone()
    }

    pub fn position(&self, entity: Entity) -> Position {
        *self
            .app
            .world()
            .get::<Position>(entity)
            .expect("entity should have a Position")
    }

    pub fn tile_center(col: usize, row: usize) -> Vec2 {
        CityGrid::tile_to_world(col, row)
    }

    /// One tile expressed in pixels, for distance assertions.
    pub fn tile(n: f32) -> f32 {
        n * TILE_SIZE
    }
}
