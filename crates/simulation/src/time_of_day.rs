use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::simulation_sets::SimulationSet;

/// In-game clock, advanced once per fixed tick. `minutes` wraps at one day
/// (1440). `speed` is game-minutes per real second.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    pub day: u32,
    pub minutes: f32,
    pub speed: f32,
    pub paused: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            day: 1,
            minutes: 8.0 * 60.0, // start at 8:00 AM
            speed: 3.0,
            paused: false,
        }
    }
}

impl GameClock {
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.minutes += self.speed * dt;
        if self.minutes >= 1440.0 {
            self.minutes -= 1440.0;
            self.day += 1;
        }
    }

    pub fn hour_of_day(&self) -> u32 {
        (self.minutes / 60.0) as u32 % 24
    }

    pub fn minute_of_hour(&self) -> u32 {
        (self.minutes % 60.0) as u32
    }

    pub fn formatted(&self) -> String {
        format!(
            "Day {} {:02}:{:02}",
            self.day,
            self.hour_of_day(),
            self.minute_of_hour()
        )
    }
}

pub fn tick_game_clock(time: Res<Time>, mut clock: ResMut<GameClock>) {
    clock.advance(time.delta_secs());
}

pub struct TimeOfDayPlugin;

impl Plugin for TimeOfDayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameClock>()
            .add_systems(FixedUpdate, tick_game_clock.in_set(SimulationSet::Clock));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_wraps_at_midnight() {
        let mut clock = GameClock {
            day: 3,
            minutes: 1439.5,
            speed: 3.0,
            paused: false,
        };
        clock.advance(1.0);
        assert_eq!(clock.day, 4);
        assert!(clock.minutes < 1440.0);
    }

    #[test]
    fn test_clock_paused_holds() {
        let mut clock = GameClock {
            paused: true,
            ..Default::default()
        };
        let before = clock.minutes;
        clock.advance(10.0);
        assert_eq!(clock.minutes, before);
    }

    #[test]
    fn test_hour_minute_split() {
        let clock = GameClock {
            minutes: 12.0 * 60.0 + 45.0,
            ..Default::default()
        };
        assert_eq!(clock.hour_of_day(), 12);
        assert_eq!(clock.minute_of_hour(), 45);
        assert_eq!(clock.formatted(), "Day 1 12:45");
    }
}
