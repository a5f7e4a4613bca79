use bevy::prelude::*;

use crate::grid::TileKind;
use crate::pedestrian::{PedState, Pedestrian, Role};
use crate::test_harness::TestTown;
use crate::zone::Zone;

fn open_town() -> TestTown {
    TestTown::new(24, 24).rebuild_roads()
}

#[test]
fn test_wanderer_never_enters_solid_tiles() {
    let mut town = TestTown::new(16, 16)
        .paint_col(8, TileKind::Building)
        .rebuild_roads();
    let ped = town.spawn_pedestrian(Role::Civilian, TestTown::tile(4.0), TestTown::tile(8.0));
    for _ in 0..600 {
        town.tick(1);
        let pos = town.position(ped);
        let grid = town.app.world().resource::<crate::grid::CityGrid>();
        assert!(!grid.solid_at(pos.x, pos.y), "walked into a wall");
    }
}

#[test]
fn test_rejected_step_rerolls_direction_instead_of_freezing() {
    // Boxed into a 3x3 pocket: every wall hit re-rolls, so the pedestrian
    // keeps moving inside the pocket rather than parking against a wall.
    let mut town = TestTown::new(16, 16).rebuild_roads();
    for i in 5..=9 {
        town = town
            .paint_tile(i, 5, TileKind::Building)
            .paint_tile(i, 9, TileKind::Building)
            .paint_tile(5, i, TileKind::Building)
            .paint_tile(9, i, TileKind::Building);
    }
    let center = TestTown::tile_center(7, 7);
    let ped = town.spawn_pedestrian(Role::Civilian, center.x, center.y);
    let mut moved_ticks = 0;
    let mut last = town.position(ped).vec();
    for _ in 0..300 {
        town.tick(1);
        let now = town.position(ped).vec();
        if now.distance(last) > 0.01 {
            moved_ticks += 1;
        }
        last = now;
        let grid = town.app.world().resource::<crate::grid::CityGrid>();
        assert!(!grid.solid_at(now.x, now.y));
    }
    assert!(moved_ticks > 100, "should keep wandering, not freeze");
}

#[test]
fn test_zoned_pedestrian_stays_in_zone() {
    let mut town = open_town();
    let zone = Zone::from_tiles((4, 8), (4, 8), 4.0);
    let center = zone.center();
    let ped = town.spawn_pedestrian(Role::Security, center.x, center.y);
    {
        let world = town.app.world_mut();
        world.get_mut::<Pedestrian>(ped).unwrap().zone = Some(zone);
    }
    for _ in 0..500 {
        town.tick(1);
        let pos = town.position(ped);
        assert!(zone.contains(pos.x, pos.y), "left its zone at {:?}", pos);
    }
}

#[test]
fn test_unzoned_civilian_avoids_construction_zone() {
    let excl = Zone::from_tiles((10, 14), (0, 23), 0.0);
    let mut town = open_town().with_construction_zone(excl);
    let ped = town.spawn_pedestrian(Role::Civilian, TestTown::tile(5.0), TestTown::tile(12.0));
    for _ in 0..500 {
        town.tick(1);
        let pos = town.position(ped);
        assert!(!excl.contains(pos.x, pos.y), "entered the work site");
    }
}

#[test]
fn test_civilians_visit_registered_doors() {
    let door = TestTown::tile_center(12, 12);
    let mut town = open_town().with_doors(vec![door]);
    let mut peds = Vec::new();
    for i in 0..6 {
        peds.push(town.spawn_pedestrian(
            Role::Civilian,
            TestTown::tile(10.0 + i as f32),
            TestTown::tile(10.0),
        ));
    }
    let mut went_inside = false;
    for _ in 0..1200 {
        town.tick(1);
        if peds.iter().any(|&p| {
            matches!(
                town.pedestrian(p).state,
                PedState::GoingInside { .. } | PedState::InsideBuilding { .. }
            )
        }) {
            went_inside = true;
            break;
        }
    }
    assert!(went_inside, "nobody ever headed for a door");
}

#[test]
fn test_pickup_capacity_is_enforced() {
    let mut town = open_town();
    let taxi = town.spawn_vehicle(
        crate::vehicle::VehicleKind::Taxi,
        crate::grid::Direction::Up,
        crate::vehicle::VehicleState::PlayerDriven,
        TestTown::tile(12.0),
        TestTown::tile(12.0),
    );
    let mut civilians = Vec::new();
    for i in 0..6 {
        civilians.push(town.spawn_pedestrian(
            Role::Civilian,
            TestTown::tile(12.0) + i as f32 * 3.0,
            TestTown::tile(12.0),
        ));
    }
    town.set_drive_input(1.0, 0.0);
    town.tick(5);
    let ledger = town
        .app
        .world()
        .resource::<super::rides::PassengerLedger>();
    assert_eq!(ledger.rider_count(), 4, "capacity caps the cab at 4");
    let riding = civilians
        .iter()
        .filter(|&&p| town.pedestrian(p).state == PedState::Riding)
        .count();
    assert_eq!(riding, 4);
    // Sanity: the taxi is actually moving fast enough to scoop.
    assert!(town.vehicle(taxi).velocity.abs() >= 15.0);
}

#[test]
fn test_stationary_taxi_picks_up_nobody() {
    let mut town = open_town();
    town.spawn_vehicle(
        crate::vehicle::VehicleKind::Taxi,
        crate::grid::Direction::Up,
        crate::vehicle::VehicleState::PlayerDriven,
        TestTown::tile(12.0),
        TestTown::tile(12.0),
    );
    let ped = town.spawn_pedestrian(
        Role::Civilian,
        TestTown::tile(12.0) + 10.0,
        TestTown::tile(12.0),
    );
    town.tick(10);
    assert_ne!(town.pedestrian(ped).state, PedState::Riding);
}

#[test]
fn test_lunch_routine_roundtrip() {
    let restaurant = TestTown::tile_center(15, 10);
    let mut town = open_town().with_restaurant_doors(vec![restaurant]);
    let post = Vec2::new(TestTown::tile(8.0), TestTown::tile(10.0));
    let zone = Zone::from_tiles((6, 10), (8, 12), 0.0);
    let worker = town.spawn_pedestrian(Role::Construction, post.x, post.y);
    {
        let world = town.app.world_mut();
        world.get_mut::<Pedestrian>(worker).unwrap().zone = Some(zone);
    }

    // Noon: off to lunch, zone lifted.
    town.set_clock_minutes(12.0 * 60.0);
    town.tick(1);
    let ped = town.pedestrian(worker);
    assert!(matches!(ped.state, PedState::LunchGoing { .. }));
    assert!(ped.zone.is_none());

    // Walks over and eats (restaurant is ~230px away at 60 px/s).
    town.tick(60);
    assert!(matches!(
        town.pedestrian(worker).state,
        PedState::LunchEating { .. }
    ));

    // Quarter to one: walks back and lands on the saved post. The check runs
    // on the arrival tick, before wandering can carry them off it.
    town.set_clock_minutes(12.0 * 60.0 + 45.0);
    let mut returned = false;
    for _ in 0..80 {
        town.tick(1);
        if !town.pedestrian(worker).state.is_lunching() {
            returned = true;
            break;
        }
    }
    assert!(returned, "never made it back from lunch");
    let ped = town.pedestrian(worker);
    let pos = town.position(worker);
    assert!(matches!(
        ped.state,
        PedState::Walking { .. } | PedState::Idle { .. }
    ));
    assert_eq!(ped.zone, Some(zone));
    assert!(pos.vec().distance(post) < 8.0, "restored near the post");
    let phase = *town
        .app
        .world()
        .resource::<super::schedule::SchedulePhase>();
    assert_eq!(phase, super::schedule::SchedulePhase::Normal);
}

#[test]
fn test_lunch_safety_pass_force_resets() {
    let restaurant = TestTown::tile_center(20, 20);
    let mut town = open_town().with_restaurant_doors(vec![restaurant]);
    let post = Vec2::new(TestTown::tile(2.0), TestTown::tile(2.0));
    let worker = town.spawn_pedestrian(Role::Construction, post.x, post.y);

    town.set_clock_minutes(12.0 * 60.0);
    town.tick(1);
    assert!(matches!(
        town.pedestrian(worker).state,
        PedState::LunchGoing { .. }
    ));

    // Jump straight past the whole window: the safety pass snaps them home
    // (give or take the one wander step taken later the same tick).
    town.set_clock_minutes(13.0 * 60.0 + 5.0);
    town.tick(1);
    let pos = town.position(worker);
    assert!(pos.vec().distance(post) < 5.0);
    assert!(!town.pedestrian(worker).state.is_lunching());
}

#[test]
fn test_only_eligible_roles_take_lunch() {
    let restaurant = TestTown::tile_center(15, 10);
    let mut town = open_town().with_restaurant_doors(vec![restaurant]);
    let guard = town.spawn_pedestrian(Role::Security, TestTown::tile(4.0), TestTown::tile(4.0));
    // Civilian style 1 is "Casual" — not a lunch-goer.
    let casual = {
        let ped = town.spawn_pedestrian(Role::Civilian, TestTown::tile(5.0), TestTown::tile(5.0));
        let world = town.app.world_mut();
        world.get_mut::<Pedestrian>(ped).unwrap().style = 1;
        ped
    };
    town.set_clock_minutes(12.0 * 60.0);
    town.tick(1);
    assert!(!town.pedestrian(guard).state.is_lunching());
    assert!(!town.pedestrian(casual).state.is_lunching());
}
