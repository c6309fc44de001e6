//! The mobile agent and everything it carries between ticks.

use std::collections::HashMap;
use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    ActivityState, Inventory, Message, MovementDirection, MovementMode, Order, OrderWeights,
    Personality, Skills, UnitId, Waypoint,
};
use crate::factions::Team;
use crate::math::Vec2;
use crate::perception;
use crate::projectile::Arrow;
use crate::tuning::{
    BASE_SPEED, CASTLE_BUILD_TIME, MAX_ENERGY, MAX_TIME_UNTIL_REST, MIN_TIME_UNTIL_REST,
    ORDER_INTERVAL, SLEEP_COOLDOWN, TRAINING_COOLDOWN,
};

/// Names handed out to new units.
const UNIT_NAMES: [&str; 10] = [
    "Arthur", "Lancelot", "Gawain", "Percival", "Galahad", "Tristan", "Guinevere", "Merlin",
    "Morgana", "Elaine",
];

/// Full hit points.
pub const MAX_HP: i32 = 100;

/// Parameters for spawning a new unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Owning team.
    pub team: Team,
    /// Initial position (clamped into the arena on spawn).
    pub position: Vec2,
    /// Body radius; hit radius is half of it.
    pub size: f32,
    /// Starting skills.
    pub skills: Skills,
    /// Fixed temperament, random when `None`.
    pub personality: Option<Personality>,
}

impl UnitSpawn {
    /// Spawn parameters with a random personality.
    #[must_use]
    pub const fn new(team: Team, position: Vec2, size: f32, skills: Skills) -> Self {
        Self {
            team,
            position,
            size,
            skills,
            personality: None,
        }
    }

    /// Fix the personality instead of rolling one.
    #[must_use]
    pub const fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = Some(personality);
        self
    }
}

/// Sleep state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepState {
    /// Currently asleep.
    pub sleeping: bool,
    /// Ticks of sleep left.
    pub timer: u32,
    /// Ticks until sleep is possible again.
    pub cooldown: u32,
}

/// Periodic rest breaks, independent of sleep.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RestCycle {
    /// Currently resting.
    pub resting: bool,
    /// Ticks of rest left.
    pub timer: u32,
    /// Ticks until the next break.
    pub time_until_rest: u32,
}

/// An autonomous agent.
#[derive(Debug, Clone)]
pub struct Unit {
    /// This unit's own key.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub team: Team,
    /// Current position.
    pub position: Vec2,
    /// Facing, in radians.
    pub angle: f32,
    /// Current velocity.
    pub velocity: Vec2,
    /// Velocity the unit is accelerating toward.
    pub target_velocity: Vec2,
    /// Body radius.
    pub size: f32,
    /// Base speed.
    pub speed: f32,
    /// Combined speed multiplier used this tick.
    pub speed_multiplier: f32,
    /// Whether the unit is still travelling to its waypoint.
    pub is_moving: bool,
    /// Travel direction relative to facing.
    pub movement_direction: MovementDirection,
    /// Gait.
    pub movement_mode: MovementMode,
    /// Skill levels.
    pub skills: Skills,
    /// Temperament.
    pub personality: Personality,
    /// Hit points; the unit is removed at zero.
    pub hp: i32,
    /// Energy in `[0, max_energy]`.
    pub energy: f32,
    /// Energy ceiling.
    pub max_energy: f32,
    /// Sleep state machine.
    pub sleep: SleepState,
    /// Rest break cycle.
    pub rest: RestCycle,
    /// Worker economy state.
    pub activity: ActivityState,
    /// Hands and carried food.
    pub inventory: Inventory,
    /// Ticks left on the castle under construction.
    pub build_timer: u32,
    /// Where the unit is heading.
    pub current_waypoint: Waypoint,
    /// Candidate replacement for `current_waypoint`.
    pub alt_waypoint: Waypoint,
    /// Locked enemy, if it still exists.
    pub current_target: Option<UnitId>,
    /// Ticks before a new target may be acquired.
    pub target_lock_timer: u32,
    /// Drawing the bow.
    pub aiming: bool,
    /// Ticks until the arrow is loosed.
    pub aiming_timer: u32,
    /// Ticks until the next aim may start.
    pub fire_cooldown: u32,
    /// Arrows in flight fired by this unit.
    pub arrows: Vec<Arrow>,
    /// Persistent feelings toward nearby units, in `[-1, 1)`.
    pub affinities: HashMap<UnitId, f32>,
    /// Order chosen by this leader.
    pub current_order: Option<Order>,
    /// Order draw weights.
    pub order_weights: OrderWeights,
    /// Ticks until the next order.
    pub order_timer: u32,
    /// Ticks until training is possible again.
    pub train_cooldown: u32,
    /// What the unit is saying.
    pub message: Option<Message>,
    /// Selected by the player.
    pub selected: bool,
}

impl Unit {
    /// Create a unit. Waypoint scores are left at zero until the unit is
    /// placed in a world.
    pub fn new<R: Rng + ?Sized>(id: UnitId, spawn: UnitSpawn, rng: &mut R) -> Self {
        let personality = spawn
            .personality
            .unwrap_or_else(|| Personality::random(rng));
        let name = UNIT_NAMES[rng.gen_range(0..UNIT_NAMES.len())].to_string();

        Self {
            id,
            name,
            team: spawn.team,
            position: spawn.position,
            angle: rng.gen_range(0.0..TAU),
            velocity: Vec2::ZERO,
            target_velocity: Vec2::ZERO,
            size: spawn.size,
            speed: BASE_SPEED,
            speed_multiplier: 1.0,
            is_moving: false,
            movement_direction: MovementDirection::Forward,
            movement_mode: MovementMode::Walk,
            skills: spawn.skills,
            personality,
            hp: MAX_HP,
            energy: MAX_ENERGY,
            max_energy: MAX_ENERGY,
            sleep: SleepState {
                cooldown: SLEEP_COOLDOWN,
                ..SleepState::default()
            },
            rest: RestCycle {
                time_until_rest: rng.gen_range(MIN_TIME_UNTIL_REST..MAX_TIME_UNTIL_REST),
                ..RestCycle::default()
            },
            activity: ActivityState::Idle,
            inventory: Inventory::default(),
            build_timer: CASTLE_BUILD_TIME,
            current_waypoint: Waypoint::new(spawn.position, 0.0),
            alt_waypoint: Waypoint::new(spawn.position, 0.0),
            current_target: None,
            target_lock_timer: 0,
            aiming: false,
            aiming_timer: 0,
            fire_cooldown: rng.gen_range(50..150),
            arrows: Vec::new(),
            affinities: HashMap::new(),
            current_order: None,
            order_weights: OrderWeights::default(),
            order_timer: ORDER_INTERVAL,
            train_cooldown: TRAINING_COOLDOWN,
            message: None,
            selected: false,
        }
    }

    /// Whether `point` lies inside this unit's vision cone.
    #[must_use]
    pub fn can_see(&self, point: Vec2) -> bool {
        perception::is_visible(self.position, self.angle, point)
    }

    /// Whether `point` lies inside this unit's body.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.position.distance(point) <= self.size
    }

    /// Radius within which arrows strike.
    #[must_use]
    pub fn hit_radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Show a message for the standard duration.
    pub fn say(&mut self, text: impl Into<String>) {
        self.message = Some(Message::new(text));
    }

    /// Show a message with probability `chance`.
    pub fn maybe_say<R: Rng + ?Sized>(&mut self, rng: &mut R, chance: f64, text: &str) {
        if rng.gen_bool(chance) {
            self.say(text);
        }
    }

    /// Count down the current message, dropping it when it expires.
    pub fn tick_message(&mut self) {
        if let Some(message) = self.message.as_mut() {
            message.remaining = message.remaining.saturating_sub(1);
            if message.remaining == 0 {
                self.message = None;
            }
        }
    }

    /// Set the current waypoint.
    pub fn set_waypoint(&mut self, position: Vec2, score: f32) {
        self.current_waypoint = Waypoint::new(position, score);
    }

    /// Clamp energy into `[0, max_energy]`.
    pub fn clamp_energy(&mut self) {
        self.energy = self.energy.clamp(0.0, self.max_energy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use slotmap::SlotMap;

    #[test]
    fn test_new_unit_defaults() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut units: SlotMap<UnitId, ()> = SlotMap::with_key();
        let id = units.insert(());
        let unit = Unit::new(
            id,
            UnitSpawn::new(Team::Blue, Vec2::new(200.0, 200.0), 35.0, Skills::fighter())
                .with_personality(Personality::Aggressive),
            &mut rng,
        );

        assert_eq!(unit.hp, MAX_HP);
        assert_eq!(unit.energy, MAX_ENERGY);
        assert_eq!(unit.personality, Personality::Aggressive);
        assert_eq!(unit.activity, ActivityState::Idle);
        assert!(unit.fire_cooldown >= 50 && unit.fire_cooldown < 150);
        assert!(unit.rest.time_until_rest >= MIN_TIME_UNTIL_REST);
        assert!(unit.angle >= 0.0 && unit.angle < TAU);
        assert!((unit.hit_radius() - 17.5).abs() < 1e-6);
    }

    #[test]
    fn test_message_expires() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut units: SlotMap<UnitId, ()> = SlotMap::with_key();
        let id = units.insert(());
        let mut unit = Unit::new(
            id,
            UnitSpawn::new(Team::Red, Vec2::new(200.0, 200.0), 20.0, Skills::NONE),
            &mut rng,
        );

        unit.say("Hello");
        for _ in 0..crate::tuning::MESSAGE_DURATION - 1 {
            unit.tick_message();
        }
        assert!(unit.message.is_some());
        unit.tick_message();
        assert!(unit.message.is_none());
    }
}
