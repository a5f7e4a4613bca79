use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::sim_rng::SimRng;
use crate::zone::Zone;

/// Sprite footprint in world pixels (the renderer owns the actual art).
pub const PED_WIDTH: f32 = 20.0;
pub const PED_HEIGHT: f32 = 28.0;

pub const WALK_TIME_MIN: f32 = 3.0;
pub const WALK_TIME_MAX: f32 = 8.0;
pub const IDLE_TIME_MIN: f32 = 1.0;
pub const IDLE_TIME_MAX: f32 = 4.0;
pub const INSIDE_TIME_MIN: f32 = 8.0;
pub const INSIDE_TIME_MAX: f32 = 20.0;

/// Behavior class. Dialogue and a handful of special rules key off this;
/// everything else about appearance is host-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Civilian,
    FootballPlayer,
    StarPlayer,
    Security,
    Coach,
    Referee,
    Construction,
    GarbageWorker,
    Prisoner,
    BasketballPlayer,
    BasketballCoach,
    TowelStaff,
}

impl Role {
    /// Roles that stand at a post instead of wandering.
    pub fn is_stationary(self) -> bool {
        matches!(self, Role::Coach | Role::BasketballCoach | Role::GarbageWorker)
    }
}

/// Everything a lunch-goer needs to come back: the exact saved position, the
/// zone to restore, and whether to resume idling or walking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedPost {
    pub pos: Vec2,
    pub zone: Option<Zone>,
    pub resume_idle: bool,
}

/// Pedestrian behavior state. Each variant carries its own payload so no
/// stale side-field can describe a state the pedestrian isn't in.
#[derive(Debug, Clone, PartialEq)]
pub enum PedState {
    Walking { timer: f32 },
    Idle { timer: f32 },
    /// Riding in the player's vehicle; invisible until released.
    Riding,
    DroppedOff { timer: f32 },
    GoingInside { door: Vec2, timer: f32 },
    InsideBuilding { door: Vec2, timer: f32 },
    /// One-tile evasive step away from an active siren.
    SirenDodge { origin: Vec2, target: Vec2 },
    LunchGoing { target: Vec2, post: SavedPost },
    LunchEating { post: SavedPost },
    LunchReturning { post: SavedPost },
    /// Bench micro-machine for benched ballplayers.
    GoingDrink,
    Drinking { timer: f32 },
    ReturnBench,
}

impl PedState {
    pub fn walking(rng: &mut SimRng) -> Self {
        PedState::Walking {
            timer: WALK_TIME_MIN + rng.0.gen::<f32>() * (WALK_TIME_MAX - WALK_TIME_MIN),
        }
    }

    pub fn idle(rng: &mut SimRng) -> Self {
        PedState::Idle {
            timer: IDLE_TIME_MIN + rng.0.gen::<f32>() * (IDLE_TIME_MAX - IDLE_TIME_MIN),
        }
    }

    /// Idle that never times out on its own (posts, bench seats).
    pub fn idle_forever() -> Self {
        PedState::Idle { timer: f32::INFINITY }
    }

    /// Whether the pedestrian is present in the world for rendering.
    pub fn is_visible(&self) -> bool {
        !matches!(self, PedState::Riding | PedState::InsideBuilding { .. })
    }

    /// States in which the player can strike up a conversation.
    pub fn is_talkable(&self) -> bool {
        matches!(
            self,
            PedState::Walking { .. }
                | PedState::Idle { .. }
                | PedState::SirenDodge { .. }
                | PedState::LunchEating { .. }
                | PedState::GoingDrink
                | PedState::Drinking { .. }
                | PedState::ReturnBench
        )
    }

    /// States from which a taxi can scoop this pedestrian up.
    pub fn can_be_picked_up(&self) -> bool {
        matches!(self, PedState::Walking { .. } | PedState::Idle { .. })
    }

    pub fn is_lunching(&self) -> bool {
        matches!(
            self,
            PedState::LunchGoing { .. } | PedState::LunchEating { .. } | PedState::LunchReturning { .. }
        )
    }
}

/// One NPC. Created at load, never destroyed; endlessly recycled between
/// states. Position lives in the shared `Position` component.
#[derive(Component, Debug, Clone)]
pub struct Pedestrian {
    pub role: Role,
    /// Index into the host-configured `StyleTable`.
    pub style: usize,
    pub state: PedState,
    pub direction: Direction,
    /// Walk speed in px/s, rolled per pedestrian at spawn.
    pub speed: f32,
    /// Where this pedestrian re-appears after a ride.
    pub spawn: Vec2,
    /// Wander bounds; `None` roams the whole map.
    pub zone: Option<Zone>,
}

impl Pedestrian {
    pub fn new(role: Role, style: usize, spawn: Vec2, speed: f32, rng: &mut SimRng) -> Self {
        Self {
            role,
            style,
            state: PedState::walking(rng),
            direction: Direction::ALL[rng.0.gen_range(0..4)],
            speed,
            spawn,
            zone: None,
        }
    }

    /// Depth-sort key offset from the center to the feet.
    pub fn sort_y_offset(&self) -> f32 {
        PED_HEIGHT * 0.5
    }

    /// Uniform pick among the three directions other than the current one.
    pub fn pick_new_direction(&mut self, rng: &mut SimRng) {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| d != self.direction)
            .collect();
        self.direction = options[rng.0.gen_range(0..options.len())];
    }
}

/// Cosmetic style entry: display name plus the one flag the simulation
/// cares about. Palettes live with the host renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedStyle {
    pub name: String,
    pub takes_lunch: bool,
}

/// Host-configurable civilian style roster.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct StyleTable(pub Vec<PedStyle>);

impl Default for StyleTable {
    fn default() -> Self {
        let style = |name: &str, takes_lunch: bool| PedStyle {
            name: name.to_string(),
            takes_lunch,
        };
        Self(vec![
            style("Business", true),
            style("Casual", false),
            style("Jogger", false),
            style("Tourist", false),
            style("Student", false),
            style("Worker", true),
            style("Lady", false),
            style("Old Man", false),
        ])
    }
}

impl StyleTable {
    pub fn name(&self, index: usize) -> &str {
        &self.0[index % self.0.len()].name
    }

    pub fn takes_lunch(&self, index: usize) -> bool {
        self.0[index % self.0.len()].takes_lunch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_new_direction_changes() {
        let mut rng = SimRng::from_seed_u64(3);
        let mut ped = Pedestrian::new(Role::Civilian, 0, Vec2::ZERO, 40.0, &mut rng);
        for _ in 0..50 {
            let before = ped.direction;
            ped.pick_new_direction(&mut rng);
            assert_ne!(ped.direction, before);
        }
    }

    #[test]
    fn test_visibility() {
        assert!(!PedState::Riding.is_visible());
        assert!(!PedState::InsideBuilding {
            door: Vec2::ZERO,
            timer: 1.0
        }
        .is_visible());
        assert!(PedState::Walking { timer: 1.0 }.is_visible());
        assert!(PedState::DroppedOff { timer: 1.0 }.is_visible());
    }

    #[test]
    fn test_pickup_eligible_states() {
        assert!(PedState::Walking { timer: 1.0 }.can_be_picked_up());
        assert!(PedState::Idle { timer: 1.0 }.can_be_picked_up());
        assert!(!PedState::Riding.can_be_picked_up());
        assert!(!PedState::GoingInside {
            door: Vec2::ZERO,
            timer: 1.0
        }
        .can_be_picked_up());
    }

    #[test]
    fn test_default_styles_lunch_flags() {
        let table = StyleTable::default();
        assert!(table.takes_lunch(0)); // Business
        assert!(table.takes_lunch(5)); // Worker
        assert!(!table.takes_lunch(1)); // Casual
        assert_eq!(table.name(7), "Old Man");
    }

    #[test]
    fn test_stationary_roles() {
        assert!(Role::Coach.is_stationary());
        assert!(Role::GarbageWorker.is_stationary());
        assert!(!Role::Civilian.is_stationary());
        assert!(!Role::BasketballPlayer.is_stationary());
    }
}
