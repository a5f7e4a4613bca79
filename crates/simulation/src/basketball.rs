//! Scripted arena game built from ordinary pedestrians: two rosters, a shot
//! clock resolving one discrete play at a time, periodic substitutions, and a
//! bench drink routine that runs regardless of the score.
//!
//! The ball never exists as an entity; possession is an `Option<Entity>` on
//! the game resource, so a benched or missing handler can always be replaced
//! by re-seeding possession.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TILE_SIZE;
use crate::grid::{CityGrid, Direction, Position};
use crate::pedestrian::{PedState, Pedestrian, Role};
use crate::sim_rng::SimRng;
use crate::simulation_sets::SimulationSet;
use crate::vehicle::Vehicle;
use crate::zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn other(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }

    fn index(self) -> usize {
        match self {
            Team::Home => 0,
            Team::Away => 1,
        }
    }
}

/// Roster tag for arena players. Everything else about them is an ordinary
/// `Pedestrian` with a court or sideline zone.
#[derive(Component, Debug, Clone)]
pub struct Baller {
    pub team: Team,
    pub jersey: u8,
    pub on_court: bool,
    pub bench_seat: Vec2,
    pub drink_target: Vec2,
    /// Countdown until a benched player wants a drink.
    pub drink_timer: f32,
}

/// Court geometry in tile coordinates, supplied by the map author.
#[derive(Resource, Debug, Clone, Copy)]
pub struct CourtLayout {
    pub court_cols: (usize, usize),
    pub court_rows: (usize, usize),
    pub sideline_cols: (usize, usize),
    pub sideline_rows: (usize, usize),
    /// Column of the home bench (west sideline).
    pub bench_col: usize,
    pub bench_rows: (usize, usize),
    pub drink_col: usize,
    pub drink_row: usize,
    pub fence_cols: (usize, usize),
    pub fence_rows: (usize, usize),
}

impl CourtLayout {
    pub fn court_zone(&self) -> Zone {
        Zone::from_tiles(self.court_cols, self.court_rows, 4.0)
    }

    pub fn sideline_zone(&self) -> Zone {
        Zone::from_tiles(self.sideline_cols, self.sideline_rows, 4.0)
    }
}

/// Shared game state: score, the two play timers, and who has the ball.
#[derive(Resource, Debug, Default)]
pub struct BasketballGame {
    pub score: [u32; 2],
    pub shot_clock: f32,
    pub sub_timer: f32,
    pub ball: Option<Entity>,
    pub court_zone: Option<Zone>,
}

impl BasketballGame {
    pub fn score_for(&self, team: Team) -> u32 {
        self.score[team.index()]
    }
}

const HOME_JERSEYS: [u8; 8] = [1, 3, 5, 11, 23, 30, 42, 8];
const AWAY_JERSEYS: [u8; 8] = [2, 7, 15, 21, 34, 44, 50, 10];

/// Seconds between discrete plays.
const SHOT_CLOCK_MIN: f32 = 2.5;
const SHOT_CLOCK_SPREAD: f32 = 4.0;

/// Seconds between substitution rounds.
const SUB_INTERVAL_MIN: f32 = 80.0;
const SUB_INTERVAL_SPREAD: f32 = 40.0;

const BENCH_SPEED: f32 = 30.0;
const DRINK_WALK_SPEED: f32 = 35.0;
const DRINK_SECONDS: f32 = 2.0;

/// Spawn both rosters, coaches, referees, security, and towel staff around a
/// court, and seed possession with a random home starter.
pub fn spawn_basketball_crowd(
    commands: &mut Commands,
    layout: &CourtLayout,
    game: &mut BasketballGame,
    rng: &mut SimRng,
) {
    let court = layout.court_zone();
    let sideline = layout.sideline_zone();
    let bench_start_y = layout.bench_rows.0 as f32 * TILE_SIZE;
    let bench_spacing = TILE_SIZE * 0.8;
    let home_bench_x = layout.bench_col as f32 * TILE_SIZE + TILE_SIZE * 0.5 - 4.0;
    let away_bench_x = layout.sideline_cols.1 as f32 * TILE_SIZE + TILE_SIZE * 0.5 - 4.0;
    let drink = CityGrid::tile_to_world(layout.drink_col, layout.drink_row);

    let mut home_starters = Vec::new();
    for team in [Team::Home, Team::Away] {
        let (jerseys, bench_x) = match team {
            Team::Home => (&HOME_JERSEYS, home_bench_x),
            Team::Away => (&AWAY_JERSEYS, away_bench_x),
        };
        let mut bench_index = 0;
        for (i, &jersey) in jerseys.iter().enumerate() {
            let on_court = i < 5;
            let seat_row = if on_court { 0 } else { bench_index };
            let seat = Vec2::new(bench_x, bench_start_y + seat_row as f32 * bench_spacing);
            if !on_court {
                bench_index += 1;
            }
            let spawn = if on_court {
                Vec2::new(
                    court.x1 + 10.0 + rng.0.gen::<f32>() * (court.x2 - court.x1 - 30.0),
                    court.y1 + 10.0 + rng.0.gen::<f32>() * (court.y2 - court.y1 - 30.0),
                )
            } else {
                seat
            };
            let speed = if on_court {
                match team {
                    Team::Home => 70.0 + rng.0.gen::<f32>() * 30.0,
                    Team::Away => 65.0 + rng.0.gen::<f32>() * 30.0,
                }
            } else {
                BENCH_SPEED
            };
            let mut ped = Pedestrian::new(Role::BasketballPlayer, i, spawn, speed, rng);
            ped.zone = Some(if on_court { court } else { sideline });
            if !on_court {
                ped.state = PedState::idle_forever();
            }
            let drink_timer = match team {
                Team::Home => 8.0 + rng.0.gen::<f32>() * 12.0,
                Team::Away => 10.0 + rng.0.gen::<f32>() * 15.0,
            };
            let entity = commands
                .spawn((
                    ped,
                    Position::new(spawn.x, spawn.y),
                    Baller {
                        team,
                        jersey,
                        on_court,
                        bench_seat: seat,
                        drink_target: drink,
                        drink_timer,
                    },
                ))
                .id();
            if team == Team::Home && on_court {
                home_starters.push(entity);
            }
        }
    }
    game.ball = Some(home_starters[rng.0.gen_range(0..home_starters.len())]);
    game.shot_clock = 3.0 + rng.0.gen::<f32>() * 4.0;
    game.sub_timer = 100.0;
    game.court_zone = Some(court);

    // Head and assistant coaches rooted to the east sideline.
    let coach_x = layout.sideline_cols.1 as f32 * TILE_SIZE + TILE_SIZE * 0.5;
    let mid_y = (layout.court_rows.0 + layout.court_rows.1) as f32 * 0.5 * TILE_SIZE;
    let coach_posts = [
        Vec2::new(coach_x, mid_y),
        Vec2::new(coach_x, mid_y + 2.0 * TILE_SIZE),
        Vec2::new(coach_x, mid_y - TILE_SIZE),
        Vec2::new(coach_x, mid_y + 3.0 * TILE_SIZE),
    ];
    for (i, &post) in coach_posts.iter().enumerate() {
        let mut coach = Pedestrian::new(Role::BasketballCoach, i, post, 30.0, rng);
        coach.state = PedState::idle_forever();
        coach.direction = Direction::Left;
        commands.spawn((coach, Position::new(post.x, post.y)));
    }

    // Two referees on the court, two guards at the fence, two towel staff.
    for i in 0..2 {
        let spawn = Vec2::new(
            court.x1 + 20.0 + i as f32 * (court.x2 - court.x1 - 40.0),
            (court.y1 + court.y2) * 0.5 + if i == 0 { -20.0 } else { 20.0 },
        );
        let mut referee =
            Pedestrian::new(Role::Referee, i, spawn, 45.0 + rng.0.gen::<f32>() * 15.0, rng);
        referee.zone = Some(court);
        commands.spawn((referee, Position::new(spawn.x, spawn.y)));
    }
    let guard_posts = [
        Vec2::new(
            (layout.fence_cols.0 + 1) as f32 * TILE_SIZE,
            layout.fence_rows.1 as f32 * TILE_SIZE,
        ),
        Vec2::new(
            layout.fence_cols.1 as f32 * TILE_SIZE,
            layout.fence_rows.1 as f32 * TILE_SIZE,
        ),
    ];
    for (i, &post) in guard_posts.iter().enumerate() {
        let mut guard =
            Pedestrian::new(Role::Security, i, post, 25.0 + rng.0.gen::<f32>() * 10.0, rng);
        guard.zone = Some(sideline);
        commands.spawn((guard, Position::new(post.x, post.y)));
    }
    for i in 0..2 {
        let spawn = Vec2::new(
            sideline.x1 + 10.0 + i as f32 * (sideline.x2 - sideline.x1 - 30.0),
            sideline.y2 - 12.0,
        );
        let mut towel =
            Pedestrian::new(Role::TowelStaff, i, spawn, 30.0 + rng.0.gen::<f32>() * 10.0, rng);
        towel.zone = Some(sideline);
        commands.spawn((towel, Position::new(spawn.x, spawn.y)));
    }
}

pub fn update_game(
    time: Res<Time>,
    mut game: ResMut<BasketballGame>,
    mut rng: ResMut<SimRng>,
    mut players: Query<(Entity, &mut Pedestrian, &mut Position, &mut Baller), Without<Vehicle>>,
) {
    if game.court_zone.is_none() || players.is_empty() {
        return;
    }
    let dt = time.delta_secs();

    game.shot_clock -= dt;
    if game.shot_clock <= 0.0 {
        resolve_play(&mut game, &mut rng, &mut players);
        game.shot_clock = SHOT_CLOCK_MIN + rng.0.gen::<f32>() * SHOT_CLOCK_SPREAD;
    }

    game.sub_timer -= dt;
    if game.sub_timer <= 0.0 {
        run_substitutions(&mut game, &mut rng, &mut players);
        game.sub_timer = SUB_INTERVAL_MIN + rng.0.gen::<f32>() * SUB_INTERVAL_SPREAD;
    }
}

/// One discrete play, resolved by a fixed probability ladder:
/// 40% pass, next 25% shoot (45% make, 20% of makes are threes), next 15%
/// steal, remainder hold.
fn resolve_play(
    game: &mut BasketballGame,
    rng: &mut SimRng,
    players: &mut Query<(Entity, &mut Pedestrian, &mut Position, &mut Baller), Without<Vehicle>>,
) {
    let on_court: Vec<(Entity, Team)> = players
        .iter()
        .filter(|(_, _, _, b)| b.on_court)
        .map(|(e, _, _, b)| (e, b.team))
        .collect();
    if on_court.is_empty() {
        return;
    }

    let handler = game.ball.and_then(|ball| {
        on_court
            .iter()
            .find(|&&(e, _)| e == ball)
            .map(|&(e, team)| (e, team))
    });
    let Some((handler, team)) = handler else {
        // Ball lost with its handler (benched mid-play): re-seed possession.
        game.ball = Some(on_court[rng.0.gen_range(0..on_court.len())].0);
        return;
    };

    let teammates: Vec<Entity> = on_court
        .iter()
        .filter(|&&(e, t)| t == team && e != handler)
        .map(|&(e, _)| e)
        .collect();
    let opponents: Vec<Entity> = on_court
        .iter()
        .filter(|&&(_, t)| t != team)
        .map(|&(e, _)| e)
        .collect();

    let roll: f32 = rng.0.gen();
    if roll < 0.40 {
        if !teammates.is_empty() {
            game.ball = Some(teammates[rng.0.gen_range(0..teammates.len())]);
        }
    } else if roll < 0.65 {
        if rng.0.gen::<f32>() < 0.45 {
            let points = if rng.0.gen::<f32>() < 0.2 { 3 } else { 2 };
            game.score[team.index()] += points;
        }
        // Made or missed, possession flips.
        if !opponents.is_empty() {
            game.ball = Some(opponents[rng.0.gen_range(0..opponents.len())]);
        }
    } else if roll < 0.80 {
        if !opponents.is_empty() {
            game.ball = Some(opponents[rng.0.gen_range(0..opponents.len())]);
        }
    }
    // else: the handler holds / keeps dribbling.
}

/// Swap one non-handler court player per team with a bench player, trading
/// bench seats so the court never gains or loses bodies.
fn run_substitutions(
    game: &mut BasketballGame,
    rng: &mut SimRng,
    players: &mut Query<(Entity, &mut Pedestrian, &mut Position, &mut Baller), Without<Vehicle>>,
) {
    let Some(court_zone) = game.court_zone else {
        return;
    };
    for team in [Team::Home, Team::Away] {
        let on_court: Vec<Entity> = players
            .iter()
            .filter(|(e, _, _, b)| b.on_court && b.team == team && game.ball != Some(*e))
            .map(|(e, _, _, _)| e)
            .collect();
        let on_bench: Vec<Entity> = players
            .iter()
            .filter(|(_, _, _, b)| !b.on_court && b.team == team)
            .map(|(e, _, _, _)| e)
            .collect();
        if on_court.is_empty() || on_bench.is_empty() {
            continue;
        }
        let out_entity = on_court[rng.0.gen_range(0..on_court.len())];
        let in_entity = on_bench[rng.0.gen_range(0..on_bench.len())];

        let in_seat = match players.get_mut(in_entity) {
            Ok((_, _, _, baller)) => baller.bench_seat,
            Err(_) => continue,
        };

        let mut freed_seat = None;
        if let Ok((_, mut ped, _, mut baller)) = players.get_mut(out_entity) {
            freed_seat = Some(baller.bench_seat);
            // The leaver takes over the entrant's old seat.
            baller.bench_seat = in_seat;
            baller.on_court = false;
            baller.drink_timer = 6.0 + rng.0.gen::<f32>() * 10.0;
            ped.state = PedState::ReturnBench;
            ped.speed = BENCH_SPEED;
        }
        if let Ok((_, mut ped, mut pos, mut baller)) = players.get_mut(in_entity) {
            if let Some(seat) = freed_seat {
                baller.bench_seat = seat;
            }
            baller.on_court = true;
            ped.zone = Some(court_zone);
            ped.speed = 65.0 + rng.0.gen::<f32>() * 30.0;
            ped.state = PedState::Walking {
                timer: 3.0 + rng.0.gen::<f32>() * 4.0,
            };
            let center = court_zone.center();
            pos.x = center.x + (rng.0.gen::<f32>() - 0.5) * 40.0;
            pos.y = center.y + (rng.0.gen::<f32>() - 0.5) * 40.0;
        }
    }
}

/// Bench micro-machine, fully decoupled from scoring: sit, want a drink,
/// fetch it, sip for two seconds, walk back, sit again.
pub fn bench_routines(
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    mut players: Query<(&mut Pedestrian, &mut Position, &mut Baller), Without<Vehicle>>,
) {
    let dt = time.delta_secs();
    for (mut ped, mut pos, mut baller) in &mut players {
        if baller.on_court {
            continue;
        }
        match ped.state.clone() {
            PedState::Idle { .. } => {
                baller.drink_timer -= dt;
                if baller.drink_timer <= 0.0 {
                    ped.state = PedState::GoingDrink;
                    ped.speed = DRINK_WALK_SPEED;
                }
            }
            PedState::GoingDrink => {
                if arrive(&mut pos, baller.drink_target, ped.speed * dt) {
                    ped.state = PedState::Drinking {
                        timer: DRINK_SECONDS,
                    };
                } else {
                    ped.direction = Direction::from_vec(baller.drink_target - pos.vec());
                }
            }
            PedState::Drinking { mut timer } => {
                timer -= dt;
                if timer <= 0.0 {
                    ped.state = PedState::ReturnBench;
                } else {
                    ped.state = PedState::Drinking { timer };
                }
            }
            PedState::ReturnBench => {
                if arrive(&mut pos, baller.bench_seat, ped.speed * dt) {
                    ped.state = PedState::idle_forever();
                    baller.drink_timer = 8.0 + rng.0.gen::<f32>() * 15.0;
                } else {
                    ped.direction = Direction::from_vec(baller.bench_seat - pos.vec());
                }
            }
            _ => {}
        }
    }
}

fn arrive(pos: &mut Position, target: Vec2, step: f32) -> bool {
    let delta = target - pos.vec();
    let dist = delta.length();
    if dist < 8.0 {
        return true;
    }
    let step = step.min(dist);
    pos.x += delta.x / dist * step;
    pos.y += delta.y / dist * step;
    false
}

pub struct BasketballPlugin;

impl Plugin for BasketballPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BasketballGame>().add_systems(
            FixedUpdate,
            (update_game, bench_routines)
                .chain()
                .in_set(SimulationSet::Crowd)
                .after(crate::crowd::wander::wander_pedestrians),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedestrian::Pedestrian;
    use crate::test_harness::TestTown;

    fn layout() -> CourtLayout {
        CourtLayout {
            court_cols: (6, 14),
            court_rows: (6, 12),
            sideline_cols: (4, 16),
            sideline_rows: (4, 14),
            bench_col: 4,
            bench_rows: (6, 9),
            drink_col: 5,
            drink_row: 13,
            fence_cols: (3, 17),
            fence_rows: (3, 15),
        }
    }

    fn arena() -> TestTown {
        let mut town = TestTown::new(24, 24).rebuild_roads();
        town.spawn_basketball(layout());
        town
    }

    fn roster_counts(town: &mut TestTown, team: Team) -> (usize, usize) {
        let world = town.app.world_mut();
        let mut query = world.query::<&Baller>();
        let mut court = 0;
        let mut bench = 0;
        for baller in query.iter(world) {
            if baller.team != team {
                continue;
            }
            if baller.on_court {
                court += 1;
            } else {
                bench += 1;
            }
        }
        (court, bench)
    }

    #[test]
    fn test_spawn_splits_rosters_five_and_three() {
        let mut town = arena();
        for team in [Team::Home, Team::Away] {
            assert_eq!(roster_counts(&mut town, team), (5, 3));
        }
        let game = town.app.world().resource::<BasketballGame>();
        assert!(game.ball.is_some());
        assert!(game.shot_clock > 0.0);
    }

    #[test]
    fn test_substitutions_preserve_roster_split() {
        let mut town = arena();
        // Long enough to cover several substitution rounds.
        for _ in 0..30 {
            town.tick(100);
            for team in [Team::Home, Team::Away] {
                assert_eq!(roster_counts(&mut town, team), (5, 3));
            }
        }
    }

    #[test]
    fn test_ball_handler_is_always_on_court() {
        let mut town = arena();
        // Long enough to cross the first substitution rounds.
        for _ in 0..2500 {
            town.tick(1);
            let ball = town.app.world().resource::<BasketballGame>().ball;
            if let Some(handler) = ball {
                let baller = town.app.world().get::<Baller>(handler).expect("handler tagged");
                assert!(baller.on_court, "ball ended up on the bench");
            }
        }
    }

    #[test]
    fn test_scores_only_increase() {
        let mut town = arena();
        let mut last = [0u32; 2];
        for _ in 0..160 {
            town.tick(25);
            let game = town.app.world().resource::<BasketballGame>();
            assert!(game.score[0] >= last[0]);
            assert!(game.score[1] >= last[1]);
            assert!(game.shot_clock <= SHOT_CLOCK_MIN + SHOT_CLOCK_SPREAD);
            last = game.score;
        }
        // Plenty of shot clocks elapsed: somebody scored.
        assert!(last[0] + last[1] > 0);
    }

    #[test]
    fn test_bench_players_run_the_drink_routine() {
        let mut town = arena();
        let bench: Vec<Entity> = {
            let world = town.app.world_mut();
            let mut query = world.query::<(Entity, &Baller)>();
            query
                .iter(world)
                .filter(|(_, b)| !b.on_court)
                .map(|(e, _)| e)
                .collect()
        };
        assert_eq!(bench.len(), 6);
        // Follow one player through a full sit → drink → sip → sit loop.
        // The first substitution is 100 s out, so the bench is stable here.
        let player = bench[0];
        let mut drank = false;
        let mut returned = false;
        for _ in 0..900 {
            town.tick(1);
            match town
                .app
                .world()
                .get::<Pedestrian>(player)
                .map(|p| p.state.clone())
            {
                Some(PedState::Drinking { .. }) => drank = true,
                Some(PedState::Idle { .. }) if drank => {
                    returned = true;
                    break;
                }
                _ => {}
            }
        }
        assert!(drank, "never fetched a drink");
        assert!(returned, "never made it back to the bench");
    }
}
