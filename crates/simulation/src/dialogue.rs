//! Dialogue line tables and selection. The text is configuration the host
//! can replace wholesale; the defaults ship the stock city flavor.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::basketball::{Baller, Team};
use crate::grid::Position;
use crate::pedestrian::{Pedestrian, Role, StyleTable};
use crate::sim_rng::SimRng;

/// How close the player must stand to start a conversation, in pixels.
pub const TALK_DISTANCE: f32 = 50.0;

/// Lines for one civilian style, keyed by the style's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleLines {
    pub style: String,
    pub lines: Vec<String>,
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DialogueLibrary {
    pub generic: Vec<String>,
    pub by_style: Vec<StyleLines>,
    pub football: Vec<String>,
    pub star: Vec<String>,
    pub security: Vec<String>,
    pub coach: Vec<String>,
    pub construction: Vec<String>,
    pub garbage: Vec<String>,
    pub prisoner: Vec<String>,
    pub basketball: Vec<String>,
    pub basketball_coach: Vec<String>,
    pub referee: Vec<String>,
    pub towel: Vec<String>,
    pub pickup: Vec<String>,
    pub dropoff: Vec<String>,
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DialogueLibrary {
    fn default() -> Self {
        let style = |name: &str, items: &[&str]| StyleLines {
            style: name.to_string(),
            lines: lines(items),
        };
        Self {
            generic: lines(&[
                "Hey there!",
                "Nice day, isn't it?",
                "Have a good one!",
                "Dude Angeles is the best city!",
                "Watch out for crazy drivers!",
                "There's some cool shops around here.",
                "I love this neighborhood.",
                "Stay safe out there!",
                "Have you been to the skate park?",
                "The food district has the best eats!",
            ]),
            by_style: vec![
                style(
                    "Business",
                    &[
                        "Can't talk, running late for a meeting!",
                        "The market is volatile today...",
                        "My boss needs those reports by 5!",
                    ],
                ),
                style(
                    "Casual",
                    &[
                        "Yo what's up, dude!",
                        "This city is pretty chill.",
                        "Heard there's great pizza nearby.",
                    ],
                ),
                style(
                    "Jogger",
                    &[
                        "Can't stop, gotta keep my heart rate up!",
                        "Running keeps the mind sharp!",
                        "Almost hit my 10k steps today!",
                    ],
                ),
                style(
                    "Tourist",
                    &[
                        "This city is amazing! So much to see!",
                        "Do you know where the beach is?",
                        "I'm taking so many photos!",
                    ],
                ),
                style(
                    "Student",
                    &[
                        "Ugh, finals are coming up...",
                        "The library has free wifi!",
                        "I should be studying right now...",
                    ],
                ),
                style(
                    "Worker",
                    &[
                        "Another day, another dollar.",
                        "Break time is the best time!",
                        "The warehouse is so hot today.",
                    ],
                ),
                style(
                    "Lady",
                    &[
                        "Excuse me, do you know the time?",
                        "The flower beds are so pretty!",
                        "Love the weather today!",
                    ],
                ),
                style(
                    "Old Man",
                    &[
                        "Back in my day, this was all fields!",
                        "Young people these days...",
                        "I remember when gas was a dollar!",
                    ],
                ),
            ],
            football: lines(&[
                "We're gonna crush it this season! ROAR!",
                "Dude Dinosaurs, baby!",
                "Coach has us running drills all day!",
                "Did you see last week's game? Epic!",
                "Gotta stay focused. Big game Saturday.",
                "You play football? You should try out!",
                "Defense wins championships!",
                "I bench 350, bro. No cap.",
            ]),
            star: lines(&["Want my signature?"]),
            security: lines(&[
                "Move along, nothing to see here.",
                "Authorized personnel only past this point.",
                "Sir, I'm gonna need to see your ticket.",
                "Stay behind the sidelines, please.",
                "Keep the area clear, folks.",
                "No flash photography during practice.",
                "This area is restricted.",
            ]),
            coach: lines(&[
                "Alright, let's HUSTLE! Run it again!",
                "Dude Dinosaurs are going ALL the way!",
                "These kids have real talent, I tell ya.",
                "DEFENSE! DEFENSE! DEFENSE!",
                "We need more water out here! HYDRATE!",
                "You want on the team? Show me what you got!",
            ]),
            construction: lines(&[
                "Watch your step, hard hat area!",
                "We're building condos here. Fancy ones!",
                "Hey, hand me that wrench!",
                "Break time isn't for another hour...",
                "This foundation is solid, trust me.",
                "The foreman's been on our case all day.",
                "Safety first, always!",
            ]),
            garbage: lines(&[
                "The city's trash won't pick itself up!",
                "Four cans per run, then dump at the center.",
                "Those garbage trucks are heavy, be careful!",
                "We keep Dude Angeles clean!",
                "Always wear your vest on duty!",
                "The dump is right here when you're full.",
            ]),
            prisoner: lines(&[
                "They only give cold beans and tortilla!",
                "I didn't do it, I swear!",
                "How long have I been in here?",
                "Tell my lawyer I want out!",
                "The food here is terrible...",
                "I was framed, dude!",
                "Cold beans and tortilla again today...",
                "At least I got a roof over my head.",
            ]),
            basketball: lines(&[
                "Dynamic Dudes all the way!",
                "Did you see that crossover? Nasty!",
                "Nothing but net, baby!",
                "We're going to the championship!",
                "Ball don't lie!",
                "Get that weak stuff outta here!",
                "Swish! That's how we do it!",
                "Time to dunk on these fools!",
            ]),
            basketball_coach: lines(&[
                "Run the play! Run the play!",
                "Defense! Get back on D!",
                "Box out! Grab the rebound!",
                "Time out! Huddle up!",
                "Great hustle out there!",
                "We need to pick up the pace!",
            ]),
            referee: lines(&[
                "Keep it clean, players!",
                "That's a foul! Two shots!",
                "Play on!",
                "Technical foul warning!",
                "Watch the travel!",
            ]),
            towel: lines(&[
                "Fresh towel here!",
                "Need a wipe-down? Here you go!",
                "Keeping the court dry!",
                "Towel? Towel? Anyone?",
            ]),
            pickup: lines(&[
                "To the skate park, please!",
                "Thanks for stopping!",
                "Let's go, dude!",
                "Hit it!",
                "Step on it!",
                "Skate park, and make it snappy!",
                "Finally, a ride!",
                "Rad! Let's roll!",
                "Awesome, I need a lift!",
            ]),
            dropoff: lines(&[
                "Thanks for the ride, dude!",
                "Here's your fare!",
                "That was a gnarly ride!",
                "Later, dude!",
                "You're the best driver!",
                "Sick ride, bro!",
                "That was rad!",
            ]),
        }
    }
}

impl DialogueLibrary {
    /// Random line for a pedestrian, by role; civilians mix their style table
    /// with the generic pool.
    pub fn dialogue_for(&self, ped: &Pedestrian, styles: &StyleTable, rng: &mut SimRng) -> &str {
        let table: &[String] = match ped.role {
            Role::FootballPlayer => &self.football,
            Role::StarPlayer => &self.star,
            Role::Security => &self.security,
            Role::Coach => &self.coach,
            Role::Construction => &self.construction,
            Role::GarbageWorker => &self.garbage,
            Role::Prisoner => &self.prisoner,
            Role::BasketballPlayer => &self.basketball,
            Role::BasketballCoach => &self.basketball_coach,
            Role::Referee => &self.referee,
            Role::TowelStaff => &self.towel,
            Role::Civilian => {
                let name = styles.name(ped.style);
                let specific = self
                    .by_style
                    .iter()
                    .find(|entry| entry.style == name)
                    .map(|entry| entry.lines.as_slice())
                    .unwrap_or(&[]);
                let total = specific.len() + self.generic.len();
                let idx = rng.0.gen_range(0..total);
                return if idx < specific.len() {
                    &specific[idx]
                } else {
                    &self.generic[idx - specific.len()]
                };
            }
        };
        &table[rng.0.gen_range(0..table.len())]
    }

    pub fn pickup_line(&self, rng: &mut SimRng) -> &str {
        &self.pickup[rng.0.gen_range(0..self.pickup.len())]
    }

    pub fn dropoff_line(&self, rng: &mut SimRng) -> &str {
        &self.dropoff[rng.0.gen_range(0..self.dropoff.len())]
    }
}

/// HUD display name: civilians show their style, rostered players show team
/// and jersey number, everyone else shows the role.
pub fn display_name(ped: &Pedestrian, styles: &StyleTable, baller: Option<&Baller>) -> String {
    if let Some(b) = baller {
        let team = match b.team {
            Team::Home => "Dude",
            Team::Away => "Nugget",
        };
        return format!("{} #{}", team, b.jersey);
    }
    match ped.role {
        Role::Civilian => styles.name(ped.style).to_string(),
        Role::FootballPlayer => "Player".to_string(),
        Role::StarPlayer => "Star Player".to_string(),
        Role::Security => "Security".to_string(),
        Role::Coach | Role::BasketballCoach => "Coach".to_string(),
        Role::Referee => "Referee".to_string(),
        Role::Construction => "Worker".to_string(),
        Role::GarbageWorker => "Garbage Foreman".to_string(),
        Role::Prisoner => "Inmate".to_string(),
        Role::BasketballPlayer => "Player".to_string(),
        Role::TowelStaff => "Towel Staff".to_string(),
    }
}

/// Nearest pedestrian the player could talk to, within `TALK_DISTANCE`.
pub fn find_nearest_talkable<'a>(
    peds: impl IntoIterator<Item = (Entity, &'a Pedestrian, &'a Position)>,
    at: Vec2,
    max_dist: f32,
) -> Option<(Entity, f32)> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, ped, pos) in peds {
        if !ped.state.is_talkable() {
            continue;
        }
        let dist = pos.distance_to(at);
        if dist < best.map_or(max_dist, |(_, d)| d) {
            best = Some((entity, dist));
        }
    }
    best
}

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogueLibrary>()
            .init_resource::<StyleTable>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedestrian::PedState;

    #[test]
    fn test_role_tables_non_empty() {
        let lib = DialogueLibrary::default();
        let styles = StyleTable::default();
        let mut rng = SimRng::from_seed_u64(11);
        for role in [
            Role::Civilian,
            Role::FootballPlayer,
            Role::StarPlayer,
            Role::Security,
            Role::Coach,
            Role::Referee,
            Role::Construction,
            Role::GarbageWorker,
            Role::Prisoner,
            Role::BasketballPlayer,
            Role::BasketballCoach,
            Role::TowelStaff,
        ] {
            let ped = Pedestrian::new(role, 0, Vec2::ZERO, 40.0, &mut rng);
            let line = lib.dialogue_for(&ped, &styles, &mut rng);
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn test_star_always_signs() {
        let lib = DialogueLibrary::default();
        let styles = StyleTable::default();
        let mut rng = SimRng::from_seed_u64(5);
        let star = Pedestrian::new(Role::StarPlayer, 0, Vec2::ZERO, 40.0, &mut rng);
        for _ in 0..10 {
            assert_eq!(lib.dialogue_for(&star, &styles, &mut rng), "Want my signature?");
        }
    }

    #[test]
    fn test_civilian_lines_draw_from_style_or_generic() {
        let lib = DialogueLibrary::default();
        let styles = StyleTable::default();
        let mut rng = SimRng::from_seed_u64(2);
        let ped = Pedestrian::new(Role::Civilian, 0, Vec2::ZERO, 40.0, &mut rng);
        let business: Vec<&str> = lib.by_style[0].lines.iter().map(|s| s.as_str()).collect();
        let generic: Vec<&str> = lib.generic.iter().map(|s| s.as_str()).collect();
        for _ in 0..40 {
            let line = lib.dialogue_for(&ped, &styles, &mut rng);
            assert!(business.contains(&line) || generic.contains(&line));
        }
    }

    #[test]
    fn test_riding_pedestrians_not_talkable() {
        let mut rng = SimRng::from_seed_u64(8);
        let mut ped = Pedestrian::new(Role::Civilian, 0, Vec2::new(5.0, 5.0), 40.0, &mut rng);
        ped.state = PedState::Riding;
        let pos = Position::new(5.0, 5.0);
        let found = find_nearest_talkable(
            [(Entity::from_raw(1), &ped, &pos)],
            Vec2::ZERO,
            TALK_DISTANCE,
        );
        assert!(found.is_none());
    }
}
